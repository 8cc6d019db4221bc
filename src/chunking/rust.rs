use super::languages::TSLanguageConfig;

pub fn rust_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["rust"],
        file_extensions: &["rs"],
        grammar: tree_sitter_rust::language,
        function_query: &["[
            (function_item
                name: (identifier)? @name
                body: (block))
        ] @function"],
        class_query: &["[
            (struct_item name: (type_identifier) @name)
            (impl_item type: (type_identifier) @name)
            (trait_item name: (type_identifier) @name)
        ] @class"],
        import_node_types: &["use_declaration"],
    }
}
