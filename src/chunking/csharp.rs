use super::languages::TSLanguageConfig;

pub fn csharp_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["csharp"],
        file_extensions: &["cs"],
        grammar: tree_sitter_c_sharp::language,
        function_query: &["[
            (method_declaration
                name: (identifier) @name
                body: (block))
            (constructor_declaration
                name: (identifier) @name
                body: (block))
        ] @function"],
        class_query: &["[
            (class_declaration name: (identifier) @name)
            (interface_declaration name: (identifier) @name)
        ] @class"],
        import_node_types: &["using_directive"],
    }
}
