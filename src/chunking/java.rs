use super::languages::TSLanguageConfig;

pub fn java_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["java"],
        file_extensions: &["java"],
        grammar: tree_sitter_java::language,
        function_query: &["[
            (method_declaration
                name: (identifier) @name
                body: (block))
            (constructor_declaration
                name: (identifier) @name
                body: (constructor_body))
        ] @function"],
        class_query: &["[
            (class_declaration name: (identifier) @name)
            (interface_declaration name: (identifier) @name)
        ] @class"],
        import_node_types: &["import_declaration"],
    }
}
