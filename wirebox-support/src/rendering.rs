//! Text rendering utilities for container diagnostics.
//!
//! Helpers to shorten type names, label named bindings, render the
//! resolution path that led to a failure, and rank registered bindings
//! for "did you mean?" hints.

/// Shortens a fully qualified type name for display.
///
/// Every path segment is reduced to its last component, including the
/// ones nested inside generic arguments.
///
/// ```
/// use wirebox_support::rendering::short_type_name;
///
/// assert_eq!(short_type_name("app::audio::AlsaAudio"), "AlsaAudio");
/// assert_eq!(short_type_name("dyn app::audio::Audio"), "dyn Audio");
/// assert_eq!(
///     short_type_name("alloc::rc::Rc<dyn app::audio::Audio>"),
///     "Rc<dyn Audio>"
/// );
/// ```
pub fn short_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut segment = String::new();
    let mut chars = full_name.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Labels a binding as `Type` or `Type["name"]`.
///
/// The default binding is registered under the empty name and renders
/// without a suffix.
///
/// ```
/// use wirebox_support::rendering::binding_label;
///
/// assert_eq!(binding_label("app::Button", ""), "Button");
/// assert_eq!(binding_label("dyn app::Audio", "Linux"), "dyn Audio[\"Linux\"]");
/// ```
pub fn binding_label(type_name: &str, name: &str) -> String {
    let short = short_type_name(type_name);
    if name.is_empty() {
        short
    } else {
        format!("{short}[{name:?}]")
    }
}

/// Renders the chain of bindings under construction, outermost first.
///
/// ```
/// use wirebox_support::rendering::render_path;
///
/// assert_eq!(render_path(&["Window", "Button", "Audio"]), "Window → Button → Audio");
/// ```
pub fn render_path(path: &[impl AsRef<str>]) -> String {
    path.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Ranks registered binding labels by similarity to the requested one.
///
/// Labels are compared on their short form, case-insensitively. A label
/// scores when one contains the other, or when they share a prefix of at
/// least three characters. At most `limit` labels are returned, best first.
pub fn closest_labels(requested: &str, available: &[String], limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let wanted = short_type_name(requested).to_lowercase();

    let mut scored: Vec<(&String, usize)> = available
        .iter()
        .filter_map(|label| {
            let candidate = short_type_name(label).to_lowercase();
            if candidate == wanted {
                return Some((label, 200));
            }
            if candidate.contains(&wanted) || wanted.contains(&candidate) {
                return Some((label, 100));
            }

            let prefix = candidate
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (prefix >= 3).then_some((label, prefix * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(limit)
        .map(|(label, _)| label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_nested_paths() {
        assert_eq!(
            short_type_name("core::option::Option<alloc::rc::Weak<dyn app::Audio>>"),
            "Option<Weak<dyn Audio>>"
        );
    }

    #[test]
    fn shortens_references_and_tuples() {
        assert_eq!(short_type_name("&app::Button"), "&Button");
        assert_eq!(short_type_name("(app::A, app::B)"), "(A, B)");
    }

    #[test]
    fn leaves_plain_names_alone() {
        assert_eq!(short_type_name("Button"), "Button");
        assert_eq!(short_type_name(""), "");
    }

    #[test]
    fn default_binding_has_no_suffix() {
        assert_eq!(binding_label("app::Audio", ""), "Audio");
    }

    #[test]
    fn render_empty_and_single_path() {
        let empty: Vec<&str> = vec![];
        assert_eq!(render_path(&empty), "");
        assert_eq!(render_path(&["Button"]), "Button");
    }

    #[test]
    fn closest_prefers_exact_short_name() {
        let available = vec![
            "dyn app::Audio[\"Linux\"]".to_string(),
            "app::AudioMixer".to_string(),
            "other::Audio".to_string(),
            "app::Button".to_string(),
        ];

        let found = closest_labels("app::Audio", &available, 3);
        assert_eq!(
            found,
            vec![
                "other::Audio".to_string(),
                "app::AudioMixer".to_string(),
                "dyn app::Audio[\"Linux\"]".to_string(),
            ]
        );
    }

    #[test]
    fn closest_by_common_prefix() {
        let available = vec!["app::Butter".to_string(), "app::Window".to_string()];
        let found = closest_labels("app::Button", &available, 3);
        assert_eq!(found, vec!["app::Butter".to_string()]);
    }

    #[test]
    fn closest_respects_limit() {
        let available = vec!["app::Audio".to_string(), "app::AudioMixer".to_string()];
        assert_eq!(closest_labels("Audio", &available, 1).len(), 1);
        assert!(closest_labels("Audio", &available, 0).is_empty());
    }

    #[test]
    fn closest_without_match() {
        let available = vec!["app::Database".to_string()];
        assert!(closest_labels("Xyz", &available, 3).is_empty());
    }
}
