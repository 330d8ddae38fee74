// src/services/phone.rs
//
// Derivações a partir do telefone do contato: DDI e UF (DDD brasileiro).

/// Códigos de país (ITU-T E.164) usados para agrupar contatos por DDI.
const DIAL_CODES: &[&str] = &[
    "1", "7", "20", "27", "30", "31", "32", "33", "34", "36", "39", "40", "41", "43", "44",
    "45", "46", "47", "48", "49", "51", "52", "53", "54", "55", "56", "57", "58", "60", "61",
    "62", "63", "64", "65", "66", "81", "82", "84", "86", "90", "91", "92", "93", "94", "95",
    "98", "211", "212", "213", "216", "218", "220", "221", "222", "223", "224", "225", "226",
    "227", "228", "229", "230", "231", "232", "233", "234", "235", "236", "237", "238", "239",
    "240", "241", "242", "243", "244", "245", "246", "248", "249", "250", "251", "252", "253",
    "254", "255", "256", "257", "258", "260", "261", "262", "263", "264", "265", "266", "267",
    "268", "269", "290", "291", "297", "298", "299", "350", "351", "352", "353", "354", "355",
    "356", "357", "358", "359", "370", "371", "372", "373", "374", "375", "376", "377", "378",
    "380", "381", "382", "383", "385", "386", "387", "389", "420", "421", "423", "500", "501",
    "502", "503", "504", "505", "506", "507", "508", "509", "590", "591", "592", "593", "594",
    "595", "596", "597", "598", "599", "670", "672", "673", "674", "675", "676", "677", "678",
    "679", "680", "681", "682", "683", "685", "686", "687", "688", "689", "690", "691", "692",
    "850", "852", "853", "855", "856", "880", "886", "960", "961", "962", "963", "964", "965",
    "966", "967", "968", "970", "971", "972", "973", "974", "975", "976", "977", "992", "993",
    "994", "995", "996", "998",
];

/// DDD -> UF.
const BR_AREA_CODES: &[(&str, &str)] = &[
    ("11", "SP"), ("12", "SP"), ("13", "SP"), ("14", "SP"), ("15", "SP"), ("16", "SP"),
    ("17", "SP"), ("18", "SP"), ("19", "SP"),
    ("21", "RJ"), ("22", "RJ"), ("24", "RJ"),
    ("27", "ES"), ("28", "ES"),
    ("31", "MG"), ("32", "MG"), ("33", "MG"), ("34", "MG"), ("35", "MG"), ("37", "MG"),
    ("38", "MG"),
    ("41", "PR"), ("42", "PR"), ("43", "PR"), ("44", "PR"), ("45", "PR"), ("46", "PR"),
    ("47", "SC"), ("48", "SC"), ("49", "SC"),
    ("51", "RS"), ("53", "RS"), ("54", "RS"), ("55", "RS"),
    ("61", "DF"),
    ("62", "GO"), ("64", "GO"),
    ("63", "TO"),
    ("65", "MT"), ("66", "MT"),
    ("67", "MS"),
    ("68", "AC"),
    ("69", "RO"),
    ("71", "BA"), ("73", "BA"), ("74", "BA"), ("75", "BA"), ("77", "BA"),
    ("79", "SE"),
    ("81", "PE"), ("87", "PE"),
    ("82", "AL"),
    ("83", "PB"),
    ("84", "RN"),
    ("85", "CE"), ("88", "CE"),
    ("86", "PI"), ("89", "PI"),
    ("91", "PA"), ("93", "PA"), ("94", "PA"),
    ("92", "AM"), ("97", "AM"),
    ("95", "RR"),
    ("96", "AP"),
    ("98", "MA"), ("99", "MA"),
];

const BR_DIAL_CODE: &str = "55";
// 55 + DDD + 8 dígitos (fixo) no mínimo
const BR_MIN_DIGITS: usize = 12;

/// Apenas os dígitos do telefone ("+55 (11) 9..." -> "5511...").
pub fn digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Filtro por DDI: prefixo textual sobre os dígitos.
pub fn has_dial_code(phone: &str, ddi: &str) -> bool {
    !ddi.is_empty() && digits(phone).starts_with(ddi)
}

/// DDI do telefone pelo maior prefixo conhecido.
pub fn dial_code(phone: &str) -> Option<&'static str> {
    let digits = digits(phone);
    (1..=3)
        .rev()
        .filter(|len| digits.len() > *len)
        .find_map(|len| DIAL_CODES.iter().find(|code| **code == &digits[..len]).copied())
}

/// UF de um telefone brasileiro a partir do DDD.
pub fn br_state(phone: &str) -> Option<&'static str> {
    let digits = digits(phone);
    if digits.len() < BR_MIN_DIGITS || !digits.starts_with(BR_DIAL_CODE) {
        return None;
    }
    let ddd = &digits[2..4];
    BR_AREA_CODES
        .iter()
        .find(|(code, _)| *code == ddd)
        .map(|(_, uf)| *uf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_formatting() {
        assert_eq!(digits("+55 (11) 99999-8888"), "5511999998888");
    }

    #[test]
    fn dial_code_prefers_longest_match() {
        assert_eq!(dial_code("+5511999998888"), Some("55"));
        assert_eq!(dial_code("+14155550100"), Some("1"));
        assert_eq!(dial_code("+351912345678"), Some("351"));
        assert_eq!(dial_code("+999"), None);
    }

    #[test]
    fn dial_code_filter_is_a_plain_prefix() {
        assert!(has_dial_code("+5511999998888", "55"));
        assert!(has_dial_code("5511999998888", "551"));
        assert!(!has_dial_code("+14155550100", "55"));
        assert!(!has_dial_code("+14155550100", ""));
    }

    #[test]
    fn maps_area_codes_to_states() {
        assert_eq!(br_state("+5511999998888"), Some("SP"));
        assert_eq!(br_state("+5521988887777"), Some("RJ"));
        assert_eq!(br_state("+5561999990000"), Some("DF"));
        assert_eq!(br_state("+559832221111"), Some("MA"));
    }

    #[test]
    fn non_brazilian_or_short_numbers_have_no_state() {
        assert_eq!(br_state("+14155550100"), None);
        assert_eq!(br_state("+55119"), None);
        // DDD 20 não existe
        assert_eq!(br_state("+5520999998888"), None);
    }
}
