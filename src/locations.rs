//! Karnataka district and taluk lookup tables, plus the dependent-field rule:
//! a taluk is only meaningful within its district, so any taluk that does not
//! belong to the chosen district is cleared before a write is issued.

use once_cell::sync::Lazy;

pub static DISTRICTS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (
            "Bagalkote",
            &["Badami", "Bagalkote", "Bilagi", "Hungund", "Jamkhandi", "Mudhol"][..],
        ),
        (
            "Ballari",
            &["Ballari", "Kampli", "Kurugodu", "Sandur", "Siruguppa"][..],
        ),
        (
            "Belagavi",
            &[
                "Athani", "Bailhongal", "Belagavi", "Chikodi", "Gokak", "Hukkeri", "Khanapur",
                "Ramdurg", "Raybag", "Savadatti",
            ][..],
        ),
        (
            "Bengaluru Rural",
            &["Devanahalli", "Doddaballapura", "Hoskote", "Nelamangala"][..],
        ),
        (
            "Bengaluru Urban",
            &["Anekal", "Bengaluru North", "Bengaluru South", "Bengaluru East", "Yelahanka"][..],
        ),
        (
            "Dakshina Kannada",
            &["Bantwal", "Belthangady", "Mangaluru", "Puttur", "Sullia"][..],
        ),
        (
            "Dharwad",
            &["Dharwad", "Hubballi", "Kalghatgi", "Kundgol", "Navalgund"][..],
        ),
        (
            "Kalaburagi",
            &["Afzalpur", "Aland", "Chincholi", "Chittapur", "Jevargi", "Kalaburagi", "Sedam"][..],
        ),
        (
            "Mysuru",
            &[
                "Heggadadevankote", "Hunsur", "Krishnarajanagara", "Mysuru", "Nanjangud",
                "Periyapatna", "Tirumakudalu Narasipura",
            ][..],
        ),
        (
            "Shivamogga",
            &["Bhadravati", "Hosanagara", "Sagara", "Shikaripura", "Shivamogga", "Sorab", "Tirthahalli"][..],
        ),
        (
            "Tumakuru",
            &[
                "Chikkanayakanahalli", "Gubbi", "Koratagere", "Kunigal", "Madhugiri", "Pavagada",
                "Sira", "Tiptur", "Tumakuru", "Turuvekere",
            ][..],
        ),
        (
            "Udupi",
            &["Brahmavara", "Byndoor", "Hebri", "Karkala", "Kaup", "Kundapura", "Udupi"][..],
        ),
    ]
});

pub fn district_names() -> Vec<&'static str> {
    DISTRICTS.iter().map(|(d, _)| *d).collect()
}

pub fn taluks_for(district: &str) -> Option<&'static [&'static str]> {
    DISTRICTS.iter().find(|(d, _)| *d == district).map(|(_, t)| *t)
}

/// Validate a (district, taluk) pair. Unknown district clears both fields;
/// a taluk outside the district's value set is cleared. Empty string means
/// "not selected", matching the stored record format.
pub fn normalize_location(district: &str, taluk: &str) -> (String, String) {
    let Some(taluks) = taluks_for(district) else {
        return (String::new(), String::new());
    };
    let taluk = if taluks.contains(&taluk) { taluk.to_string() } else { String::new() };
    (district.to_string(), taluk)
}
