//! Static country directory

use serde::Serialize;

use crate::CountryRecord;

/// Top-level directories of the factbook.json repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactbookRegion {
    Africa,
    AustraliaOceania,
    CentralAmericaNCaribbean,
    CentralAsia,
    EastNSoutheastAsia,
    Europe,
    MiddleEast,
    NorthAmerica,
    SouthAmerica,
    SouthAsia,
}

impl FactbookRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Africa => "africa",
            Self::AustraliaOceania => "australia-oceania",
            Self::CentralAmericaNCaribbean => "central-america-n-caribbean",
            Self::CentralAsia => "central-asia",
            Self::EastNSoutheastAsia => "east-n-southeast-asia",
            Self::Europe => "europe",
            Self::MiddleEast => "middle-east",
            Self::NorthAmerica => "north-america",
            Self::SouthAmerica => "south-america",
            Self::SouthAsia => "south-asia",
        }
    }
}

use FactbookRegion::*;

const fn row(
    alpha2: &'static str,
    alpha3: &'static str,
    un_numeric: Option<&'static str>,
    gec: &'static str,
    region: FactbookRegion,
    name: &'static str,
) -> CountryRecord {
    CountryRecord {
        alpha2,
        alpha3,
        un_numeric,
        gec: Some(gec),
        factbook_region: Some(region),
        name,
        world_bank: true,
    }
}

/// Comtrade publishes a handful of reporters under codes that differ from
/// ISO numeric (USA 842, France 251, India 699, Switzerland 757, Norway 579).
/// Micro-states without a Comtrade reporter entry carry `None`.
pub(crate) static COUNTRY_TABLE: &[CountryRecord] = &[
    // North America
    row("US", "USA", Some("842"), "us", NorthAmerica, "United States"),
    row("CA", "CAN", Some("124"), "ca", NorthAmerica, "Canada"),
    row("MX", "MEX", Some("484"), "mx", NorthAmerica, "Mexico"),
    // Central America & Caribbean
    row("CU", "CUB", Some("192"), "cu", CentralAmericaNCaribbean, "Cuba"),
    row("JM", "JAM", Some("388"), "jm", CentralAmericaNCaribbean, "Jamaica"),
    row("GT", "GTM", Some("320"), "gt", CentralAmericaNCaribbean, "Guatemala"),
    row("CR", "CRI", Some("188"), "cs", CentralAmericaNCaribbean, "Costa Rica"),
    // South America
    row("BR", "BRA", Some("76"), "br", SouthAmerica, "Brazil"),
    row("AR", "ARG", Some("32"), "ar", SouthAmerica, "Argentina"),
    row("CL", "CHL", Some("152"), "ci", SouthAmerica, "Chile"),
    row("CO", "COL", Some("170"), "co", SouthAmerica, "Colombia"),
    row("PE", "PER", Some("604"), "pe", SouthAmerica, "Peru"),
    row("VE", "VEN", Some("862"), "ve", SouthAmerica, "Venezuela"),
    row("UY", "URY", Some("858"), "uy", SouthAmerica, "Uruguay"),
    // Europe
    row("GB", "GBR", Some("826"), "uk", Europe, "United Kingdom"),
    row("FR", "FRA", Some("251"), "fr", Europe, "France"),
    row("DE", "DEU", Some("276"), "gm", Europe, "Germany"),
    row("IT", "ITA", Some("380"), "it", Europe, "Italy"),
    row("ES", "ESP", Some("724"), "sp", Europe, "Spain"),
    row("PT", "PRT", Some("620"), "po", Europe, "Portugal"),
    row("NL", "NLD", Some("528"), "nl", Europe, "Netherlands"),
    row("BE", "BEL", Some("56"), "be", Europe, "Belgium"),
    row("CH", "CHE", Some("757"), "sz", Europe, "Switzerland"),
    row("AT", "AUT", Some("40"), "au", Europe, "Austria"),
    row("SE", "SWE", Some("752"), "sw", Europe, "Sweden"),
    row("NO", "NOR", Some("579"), "no", Europe, "Norway"),
    row("DK", "DNK", Some("208"), "da", Europe, "Denmark"),
    row("FI", "FIN", Some("246"), "fi", Europe, "Finland"),
    row("IS", "ISL", Some("352"), "ic", Europe, "Iceland"),
    row("IE", "IRL", Some("372"), "ei", Europe, "Ireland"),
    row("PL", "POL", Some("616"), "pl", Europe, "Poland"),
    row("CZ", "CZE", Some("203"), "ez", Europe, "Czechia"),
    row("HU", "HUN", Some("348"), "hu", Europe, "Hungary"),
    row("RO", "ROU", Some("642"), "ro", Europe, "Romania"),
    row("GR", "GRC", Some("300"), "gr", Europe, "Greece"),
    row("UA", "UKR", Some("804"), "up", Europe, "Ukraine"),
    row("MC", "MCO", None, "mn", Europe, "Monaco"),
    row("LI", "LIE", None, "ls", Europe, "Liechtenstein"),
    row("SM", "SMR", None, "sm", Europe, "San Marino"),
    row("VA", "VAT", None, "vt", Europe, "Vatican"),
    row("XK", "XKX", None, "kv", Europe, "Kosovo"),
    // Central Asia
    row("RU", "RUS", Some("643"), "rs", CentralAsia, "Russia"),
    row("KZ", "KAZ", Some("398"), "kz", CentralAsia, "Kazakhstan"),
    row("UZ", "UZB", Some("860"), "uz", CentralAsia, "Uzbekistan"),
    // Middle East
    row("TR", "TUR", Some("792"), "tu", MiddleEast, "Turkey"),
    row("SA", "SAU", Some("682"), "sa", MiddleEast, "Saudi Arabia"),
    row("AE", "ARE", Some("784"), "ae", MiddleEast, "United Arab Emirates"),
    row("IL", "ISR", Some("376"), "is", MiddleEast, "Israel"),
    row("IR", "IRN", Some("364"), "ir", MiddleEast, "Iran"),
    row("IQ", "IRQ", Some("368"), "iz", MiddleEast, "Iraq"),
    row("QA", "QAT", Some("634"), "qa", MiddleEast, "Qatar"),
    // Africa
    row("EG", "EGY", Some("818"), "eg", Africa, "Egypt"),
    row("NG", "NGA", Some("566"), "ni", Africa, "Nigeria"),
    row("ZA", "ZAF", Some("710"), "sf", Africa, "South Africa"),
    row("KE", "KEN", Some("404"), "ke", Africa, "Kenya"),
    row("ET", "ETH", Some("231"), "et", Africa, "Ethiopia"),
    row("MA", "MAR", Some("504"), "mo", Africa, "Morocco"),
    row("GH", "GHA", Some("288"), "gh", Africa, "Ghana"),
    row("DZ", "DZA", Some("12"), "ag", Africa, "Algeria"),
    // South Asia
    row("IN", "IND", Some("699"), "in", SouthAsia, "India"),
    row("PK", "PAK", Some("586"), "pk", SouthAsia, "Pakistan"),
    row("BD", "BGD", Some("50"), "bg", SouthAsia, "Bangladesh"),
    row("LK", "LKA", Some("144"), "ce", SouthAsia, "Sri Lanka"),
    // East & Southeast Asia
    row("CN", "CHN", Some("156"), "ch", EastNSoutheastAsia, "China"),
    row("JP", "JPN", Some("392"), "ja", EastNSoutheastAsia, "Japan"),
    row("HK", "HKG", Some("344"), "hk", EastNSoutheastAsia, "Hong Kong"),
    row("KR", "KOR", Some("410"), "ks", EastNSoutheastAsia, "South Korea"),
    row("ID", "IDN", Some("360"), "id", EastNSoutheastAsia, "Indonesia"),
    row("TH", "THA", Some("764"), "th", EastNSoutheastAsia, "Thailand"),
    row("VN", "VNM", Some("704"), "vm", EastNSoutheastAsia, "Vietnam"),
    row("PH", "PHL", Some("608"), "rp", EastNSoutheastAsia, "Philippines"),
    row("MY", "MYS", Some("458"), "my", EastNSoutheastAsia, "Malaysia"),
    row("SG", "SGP", Some("702"), "sn", EastNSoutheastAsia, "Singapore"),
    CountryRecord {
        alpha2: "TW",
        alpha3: "TWN",
        un_numeric: None,
        gec: Some("tw"),
        factbook_region: Some(EastNSoutheastAsia),
        name: "Taiwan",
        world_bank: false,
    },
    // Oceania
    row("AU", "AUS", Some("36"), "as", AustraliaOceania, "Australia"),
    row("NZ", "NZL", Some("554"), "nz", AustraliaOceania, "New Zealand"),
    row("FJ", "FJI", Some("242"), "fj", AustraliaOceania, "Fiji"),
    row("TV", "TUV", None, "tv", AustraliaOceania, "Tuvalu"),
    row("NR", "NRU", None, "nr", AustraliaOceania, "Nauru"),
];
