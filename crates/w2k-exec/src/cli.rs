use w2k_model::Parameters;

/// Render a parameter set as command-line tokens, in mapping order.
///
/// - `Flag(true)` emits the key alone;
/// - `Text(v)` emits the key followed by `v`;
/// - `Flag(false)` and any other value emit nothing.
///
/// Names and values pass through unchecked.
pub fn cli_options(parameters: &Parameters) -> Vec<String> {
    let mut options = Vec::with_capacity(parameters.len() * 2);
    for param in parameters.iter() {
        let value = param.value();
        if value.is_enabled_flag() {
            options.push(param.key().to_string());
        } else if let Some(text) = value.as_text() {
            options.push(param.key().to_string());
            options.push(text.to_string());
        }
    }
    options
}
