//! Internationalization (i18n) support
//!
//! Month names and the handful of interface strings the pages show.

use serde::Serialize;

/// Strings for one language
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub code: &'static str,
    pub months: [&'static str; 12],
    pub months_short: [&'static str; 12],
    pub home: &'static str,
    pub load_more: &'static str,
    pub loading: &'static str,
    pub minutes: &'static str,
    pub not_found: &'static str,
    pub load_failed: &'static str,
}

pub static PT_BR: Locale = Locale {
    code: "pt-BR",
    months: [
        "janeiro",
        "fevereiro",
        "março",
        "abril",
        "maio",
        "junho",
        "julho",
        "agosto",
        "setembro",
        "outubro",
        "novembro",
        "dezembro",
    ],
    months_short: [
        "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
    ],
    home: "Início",
    load_more: "Carregar mais posts",
    loading: "Carregando...",
    minutes: "min",
    not_found: "Post não encontrado",
    load_failed: "Não foi possível carregar o post",
};

pub static EN: Locale = Locale {
    code: "en",
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    home: "Home",
    load_more: "Load more posts",
    loading: "Loading...",
    minutes: "min",
    not_found: "Post not found",
    load_failed: "The post could not be loaded",
};

impl Locale {
    /// Look up a locale by language tag, falling back to pt-BR
    ///
    /// Matching ignores case and accepts `_` for `-`; a bare primary tag
    /// (`pt`, `en`) also matches.
    pub fn for_language(language: &str) -> &'static Locale {
        let normalized = language.trim().replace('_', "-").to_lowercase();
        let primary = normalized.split('-').next().unwrap_or_default();

        match primary {
            "en" => &EN,
            "pt" => &PT_BR,
            _ => {
                if !normalized.is_empty() {
                    tracing::warn!("Unsupported language {:?}, using pt-BR", language);
                }
                &PT_BR
            }
        }
    }

    /// Full month name for a 1-based month
    pub fn month(&self, month: u32) -> &'static str {
        self.months[(month.clamp(1, 12) - 1) as usize]
    }

    /// Abbreviated month name for a 1-based month
    pub fn month_short(&self, month: u32) -> &'static str {
        self.months_short[(month.clamp(1, 12) - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_language() {
        assert_eq!(Locale::for_language("pt-BR").code, "pt-BR");
        assert_eq!(Locale::for_language("pt_br").code, "pt-BR");
        assert_eq!(Locale::for_language("en-US").code, "en");
        assert_eq!(Locale::for_language("fr").code, "pt-BR");
    }

    #[test]
    fn test_month_names() {
        assert_eq!(PT_BR.month_short(3), "mar");
        assert_eq!(PT_BR.month_short(12), "dez");
        assert_eq!(PT_BR.month(2), "fevereiro");
        assert_eq!(EN.month_short(5), "May");
    }
}
