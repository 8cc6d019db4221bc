use super::languages::TSLanguageConfig;

pub fn go_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["go"],
        file_extensions: &["go"],
        grammar: tree_sitter_go::language,
        function_query: &["[
            (function_declaration
                name: (identifier) @name
                body: (block))
            (method_declaration
                name: (field_identifier) @name
                body: (block))
        ] @function"],
        class_query: &["(type_declaration
            (type_spec
                name: (type_identifier) @name
                type: (struct_type))) @class"],
        import_node_types: &["import_declaration"],
    }
}
