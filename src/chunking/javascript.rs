use super::languages::TSLanguageConfig;

pub fn javascript_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["javascript"],
        file_extensions: &["js", "jsx"],
        grammar: tree_sitter_javascript::language,
        function_query: &["[
            (function_declaration
                name: (identifier)? @name
                body: (statement_block))
            (generator_function_declaration
                name: (identifier)? @name
                body: (statement_block))
            (method_definition
                name: (property_identifier)? @name
                body: (statement_block))
            (function
                name: (identifier)? @name
                body: (statement_block))
            (arrow_function
                body: (_))
        ] @function"],
        class_query: &["(class_declaration
            name: (identifier)? @name) @class"],
        import_node_types: &["import_statement"],
    }
}
