//! Static fallback city tables keyed by ISO country code.
//!
//! Used when the backend has no `cities` rows for a country (fresh
//! deployments, partial imports). The first city of each table is the
//! country's default selection. Fallback ids are stable slugs
//! (`bj-cotonou`) so a selection survives until real rows exist.

use crate::models::geo::{City, Country};

/// One country's fallback entry.
pub struct FallbackCountry {
    pub code: &'static str,
    pub name: &'static str,
    /// Cities, default city first.
    pub cities: &'static [&'static str],
}

/// Countries served by the marketplace, in display order.
pub const FALLBACK_COUNTRIES: &[FallbackCountry] = &[
    FallbackCountry {
        code: "BJ",
        name: "Bénin",
        cities: &[
            "Cotonou", "Porto-Novo", "Abomey-Calavi", "Parakou", "Djougou", "Bohicon",
            "Natitingou", "Lokossa", "Ouidah", "Abomey", "Kandi", "Savalou",
        ],
    },
    FallbackCountry {
        code: "TG",
        name: "Togo",
        cities: &["Lomé", "Sokodé", "Kara", "Kpalimé", "Atakpamé", "Dapaong", "Tsévié", "Aného"],
    },
    FallbackCountry {
        code: "CI",
        name: "Côte d'Ivoire",
        cities: &[
            "Abidjan", "Yamoussoukro", "Bouaké", "Daloa", "San-Pédro", "Korhogo", "Man", "Gagnoa",
        ],
    },
    FallbackCountry {
        code: "SN",
        name: "Sénégal",
        cities: &["Dakar", "Thiès", "Saint-Louis", "Touba", "Kaolack", "Ziguinchor", "Mbour"],
    },
    FallbackCountry {
        code: "BF",
        name: "Burkina Faso",
        cities: &["Ouagadougou", "Bobo-Dioulasso", "Koudougou", "Banfora", "Ouahigouya"],
    },
    FallbackCountry {
        code: "NE",
        name: "Niger",
        cities: &["Niamey", "Zinder", "Maradi", "Agadez", "Tahoua", "Dosso"],
    },
    FallbackCountry {
        code: "ML",
        name: "Mali",
        cities: &["Bamako", "Sikasso", "Mopti", "Koutiala", "Ségou", "Kayes"],
    },
    FallbackCountry {
        code: "NG",
        name: "Nigeria",
        cities: &["Lagos", "Abuja", "Kano", "Ibadan", "Port Harcourt", "Benin City", "Kaduna"],
    },
    FallbackCountry {
        code: "GH",
        name: "Ghana",
        cities: &["Accra", "Kumasi", "Tamale", "Takoradi", "Cape Coast", "Tema"],
    },
    FallbackCountry {
        code: "CM",
        name: "Cameroun",
        cities: &["Douala", "Yaoundé", "Garoua", "Bamenda", "Bafoussam", "Maroua"],
    },
    FallbackCountry {
        code: "FR",
        name: "France",
        cities: &["Paris", "Lyon", "Marseille", "Toulouse", "Lille", "Bordeaux", "Nantes"],
    },
];

fn lookup(country_code: &str) -> Option<&'static FallbackCountry> {
    let code = country_code.trim();
    FALLBACK_COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Stable id of a fallback city: `<code>-<slug>`.
pub fn city_id(country_code: &str, name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars().flat_map(fold_accent) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    format!(
        "{}-{}",
        country_code.trim().to_ascii_lowercase(),
        slug.trim_matches('-')
    )
}

fn fold_accent(ch: char) -> Option<char> {
    let folded = match ch {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' | 'ó' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        '\'' => return None,
        other => other,
    };
    Some(folded)
}

/// Fallback cities for a country; empty for unknown codes.
pub fn cities_for(country_code: &str) -> Vec<City> {
    let Some(country) = lookup(country_code) else {
        return Vec::new();
    };
    country
        .cities
        .iter()
        .map(|name| City {
            id: city_id(country.code, name),
            name: (*name).to_string(),
            country_code: Some(country.code.to_string()),
        })
        .collect()
}

/// Default city for a country (the first fallback entry).
pub fn default_city(country_code: &str) -> Option<City> {
    cities_for(country_code).into_iter().next()
}

/// Fallback country list.
pub fn countries() -> Vec<Country> {
    FALLBACK_COUNTRIES
        .iter()
        .map(|c| Country {
            id: c.code.to_ascii_lowercase(),
            name: c.name.to_string(),
            code: c.code.to_string(),
        })
        .collect()
}

/// Whether a fallback table exists for the code.
pub fn is_known_country(country_code: &str) -> bool {
    lookup(country_code).is_some()
}
