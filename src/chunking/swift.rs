use super::languages::TSLanguageConfig;

pub fn swift_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["swift"],
        file_extensions: &["swift"],
        grammar: tree_sitter_swift::language,
        function_query: &["(function_declaration
            name: (simple_identifier)? @name) @function"],
        class_query: &["(class_declaration
            name: (type_identifier) @name) @class"],
        import_node_types: &["import_declaration"],
    }
}
