use super::languages::TSLanguageConfig;

pub fn python_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["python"],
        file_extensions: &["py"],
        grammar: tree_sitter_python::language,
        function_query: &["(function_definition
            name: (identifier) @name
            body: (block)) @function"],
        class_query: &["(class_definition
            name: (identifier) @name) @class"],
        import_node_types: &["import_statement", "import_from_statement"],
    }
}
