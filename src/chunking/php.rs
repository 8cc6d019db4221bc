use super::languages::TSLanguageConfig;

pub fn php_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["php"],
        file_extensions: &["php"],
        grammar: tree_sitter_php::language_php,
        function_query: &["[
            (function_definition
                name: (name) @name
                body: (compound_statement))
            (method_declaration
                name: (name) @name
                body: (compound_statement))
        ] @function"],
        class_query: &["(class_declaration
            name: (name) @name) @class"],
        import_node_types: &["namespace_use_declaration"],
    }
}
