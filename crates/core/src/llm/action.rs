use crate::domain::recommendation::Action;

/// Classifies a free-text model response.
///
/// The response is split into runs of ASCII alphanumerics; the first run that equals
/// `buy`, `hold` or `sell` (ignoring case) decides the action. No match yields
/// [`Action::Unknown`].
pub fn classify_action(response: &str) -> Action {
    response
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .find_map(Action::from_token)
        .unwrap_or(Action::Unknown)
}
