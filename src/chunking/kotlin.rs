use super::languages::TSLanguageConfig;

pub fn kotlin_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["kotlin"],
        file_extensions: &["kt"],
        grammar: tree_sitter_kotlin_ng::language,
        function_query: &["(function_declaration
            (simple_identifier) @name) @function"],
        class_query: &["(class_declaration
            (type_identifier) @name) @class"],
        import_node_types: &["import_list", "import_header"],
    }
}
