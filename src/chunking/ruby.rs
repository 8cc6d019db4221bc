use super::languages::TSLanguageConfig;

pub fn ruby_language_config() -> TSLanguageConfig {
    TSLanguageConfig {
        language_ids: &["ruby"],
        file_extensions: &["rb"],
        grammar: tree_sitter_ruby::language,
        function_query: &["(method
            name: (identifier) @name) @function"],
        class_query: &["(class
            name: (constant) @name) @class"],
        // Ruby has no dedicated import syntax (`require` is a plain method
        // call); we don't attempt to special-case it as ancestor context.
        import_node_types: &[],
    }
}
