use crate::semantic::Retrieved;

const SEPARATOR: &str = "\n---\n";

/// Renders retrieved movies as the context block of the prompt, in
/// retrieval order.
pub fn compose(results: &[Retrieved]) -> String {
    results
        .iter()
        .map(|m| format!("Movie: {}\nDetails: {}\n", m.title, m.info))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(title: &str, info: &str) -> Retrieved {
        Retrieved {
            title: title.to_string(),
            info: info.to_string(),
            score: 0.0,
        }
    }

    #[test]
    fn test_compose_single() {
        let context = compose(&[retrieved("Heat", "heist la")]);
        assert_eq!(context, "Movie: Heat\nDetails: heist la\n");
    }

    #[test]
    fn test_compose_keeps_order_and_separates() {
        let context = compose(&[
            retrieved("Alien", "space horror"),
            retrieved("Heat", "heist la"),
        ]);
        assert_eq!(
            context,
            "Movie: Alien\nDetails: space horror\n\n---\nMovie: Heat\nDetails: heist la\n"
        );
    }

    #[test]
    fn test_compose_empty() {
        assert_eq!(compose(&[]), "");
    }
}
