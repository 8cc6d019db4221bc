use super::languages::TSLanguageConfig;

pub fn c_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["c"],
        file_extensions: &["c", "h"],
        grammar: tree_sitter_c::language,
        function_query: &["(function_definition
            declarator: (function_declarator
                declarator: (identifier) @name)
            body: (compound_statement)) @function"],
        class_query: &["(struct_specifier
            name: (type_identifier) @name
            body: (field_declaration_list)) @class"],
        import_node_types: &["preproc_include"],
    }
}
