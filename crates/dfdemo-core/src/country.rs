//! Best-effort country-name -> ISO 3166-1 alpha-2 normalization for the `(name.XX)`
//! suffix Defrag clients embed in demo filenames.

use std::collections::HashMap;
use std::sync::OnceLock;

fn country_code_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("RUSSIA", "RU"), ("GERMANY", "DE"), ("USA", "US"), ("POLAND", "PL"),
            ("FRANCE", "FR"), ("SPAIN", "ES"), ("ITALY", "IT"), ("NETHERLANDS", "NL"),
            ("BELGIUM", "BE"), ("SWEDEN", "SE"), ("NORWAY", "NO"), ("DENMARK", "DK"),
            ("FINLAND", "FI"), ("AUSTRIA", "AT"), ("SWITZERLAND", "CH"), ("PORTUGAL", "PT"),
            ("GREECE", "GR"), ("CZECHREPUBLIC", "CZ"), ("CZECH", "CZ"), ("SLOVAKIA", "SK"),
            ("HUNGARY", "HU"), ("ROMANIA", "RO"), ("BULGARIA", "BG"), ("CROATIA", "HR"),
            ("SERBIA", "RS"), ("SLOVENIA", "SI"), ("UKRAINE", "UA"), ("BELARUS", "BY"),
            ("LITHUANIA", "LT"), ("LATVIA", "LV"), ("ESTONIA", "EE"), ("ICELAND", "IS"),
            ("IRELAND", "IE"), ("UNITEDKINGDOM", "GB"), ("UK", "GB"), ("BRITAIN", "GB"),
            ("GREATBRITAIN", "GB"), ("ENGLAND", "GB"), ("SCOTLAND", "GB"), ("WALES", "GB"),
            ("CANADA", "CA"), ("MEXICO", "MX"), ("BRAZIL", "BR"), ("ARGENTINA", "AR"),
            ("CHILE", "CL"), ("COLOMBIA", "CO"), ("PERU", "PE"), ("VENEZUELA", "VE"),
            ("AUSTRALIA", "AU"), ("NEWZEALAND", "NZ"), ("JAPAN", "JP"), ("CHINA", "CN"),
            ("SOUTHKOREA", "KR"), ("KOREA", "KR"), ("INDIA", "IN"), ("THAILAND", "TH"),
            ("VIETNAM", "VN"), ("INDONESIA", "ID"), ("MALAYSIA", "MY"), ("SINGAPORE", "SG"),
            ("PHILIPPINES", "PH"), ("TAIWAN", "TW"), ("HONGKONG", "HK"), ("ISRAEL", "IL"),
            ("TURKEY", "TR"), ("SOUTHAFRICA", "ZA"), ("EGYPT", "EG"), ("MOROCCO", "MA"),
            ("RU", "RU"), ("DE", "DE"), ("US", "US"), ("PL", "PL"), ("FR", "FR"), ("ES", "ES"),
            ("IT", "IT"), ("NL", "NL"), ("BE", "BE"), ("SE", "SE"), ("NO", "NO"), ("DK", "DK"),
            ("FI", "FI"), ("AT", "AT"), ("CH", "CH"), ("PT", "PT"), ("GR", "GR"), ("CZ", "CZ"),
            ("SK", "SK"), ("HU", "HU"), ("RO", "RO"), ("BG", "BG"), ("HR", "HR"), ("RS", "RS"),
            ("SI", "SI"), ("UA", "UA"), ("BY", "BY"), ("LT", "LT"), ("LV", "LV"), ("EE", "EE"),
            ("IS", "IS"), ("IE", "IE"), ("GB", "GB"), ("CA", "CA"), ("MX", "MX"), ("BR", "BR"),
            ("AR", "AR"), ("CL", "CL"), ("CO", "CO"), ("PE", "PE"), ("VE", "VE"), ("AU", "AU"),
            ("NZ", "NZ"), ("JP", "JP"), ("CN", "CN"), ("KR", "KR"), ("IN", "IN"), ("TH", "TH"),
            ("VN", "VN"), ("ID", "ID"), ("MY", "MY"), ("SG", "SG"), ("PH", "PH"), ("TW", "TW"),
            ("HK", "HK"), ("IL", "IL"), ("TR", "TR"), ("ZA", "ZA"), ("EG", "EG"), ("MA", "MA"),
        ])
    })
}

/// Falls back to the first two uppercased characters when `country` isn't a known name.
pub fn normalize_country_code(country: &str) -> String {
    if country.is_empty() {
        return String::new();
    }
    let normalized: String = country
        .to_uppercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '-' && *c != '_')
        .collect();
    if let Some(code) = country_code_map().get(normalized.as_str()) {
        return (*code).to_string();
    }
    let upper = country.to_uppercase();
    if upper.chars().count() >= 2 {
        upper.chars().take(2).collect()
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_full_name_resolves_to_iso_code() {
        assert_eq!(normalize_country_code("Germany"), "DE");
    }

    #[test]
    fn already_iso_code_passes_through() {
        assert_eq!(normalize_country_code("de"), "DE");
    }

    #[test]
    fn unknown_country_falls_back_to_first_two_letters() {
        assert_eq!(normalize_country_code("Narnia"), "NA");
    }

    #[test]
    fn empty_country_is_empty() {
        assert_eq!(normalize_country_code(""), "");
    }
}
