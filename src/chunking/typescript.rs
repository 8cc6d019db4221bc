use super::languages::TSLanguageConfig;

pub fn typescript_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["typescript"],
        file_extensions: &["ts", "tsx"],
        grammar: tree_sitter_typescript::language_tsx,
        function_query: &["[
            (function_declaration
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
        class_query: &["[
            (class_declaration name: (type_identifier)? @name)
            (interface_declaration name: (type_identifier) @name)
        ] @class"],
        import_node_types: &["import_statement"],
    }
}
