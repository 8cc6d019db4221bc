use super::languages::TSLanguageConfig;

pub fn cpp_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["cpp"],
        file_extensions: &["cpp", "hpp"],
        grammar: tree_sitter_cpp::language,
        function_query: &["[
            (function_definition
                declarator: (function_declarator
                    declarator: (identifier) @name)
                body: (compound_statement))
            (function_definition
                declarator: (function_declarator
                    declarator: (field_identifier) @name)
                body: (compound_statement))
        ] @function"],
        class_query: &["[
            (class_specifier name: (type_identifier) @name)
            (struct_specifier name: (type_identifier) @name)
        ] @class"],
        import_node_types: &["preproc_include", "using_declaration"],
    }
}
