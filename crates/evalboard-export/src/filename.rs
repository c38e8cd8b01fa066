//! 내보내기 파일 이름 규칙.
//!
//! `{직원}_Analytics_{기간}_{YYYY-MM-DD}.{확장자}`. 직원 이름과 기간 이름은
//! ASCII 영숫자 외 모든 문자를 `_`로 치환한다.

use chrono::NaiveDate;

/// ASCII 영숫자 외 문자를 `_`로 치환
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// 리포트 파일 이름 생성
pub fn report_filename(employee: &str, period: &str, date: NaiveDate, extension: &str) -> String {
    format!(
        "{}_Analytics_{}_{}.{}",
        sanitize(employee),
        sanitize(period),
        date.format("%Y-%m-%d"),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn builds_contract_filename() {
        assert_eq!(
            report_filename("Jane Doe", "Q3 2026", date(), "pdf"),
            "Jane_Doe_Analytics_Q3_2026_2026-10-15.pdf"
        );
    }

    #[test]
    fn non_ascii_characters_become_underscores() {
        // 한글은 문자 단위로 치환
        assert_eq!(sanitize("김철수"), "___");
        assert_eq!(sanitize("O'Brien-Smith"), "O_Brien_Smith");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["Jane Doe", "Q1/Q2 (draft)", "émilie.zoë", "a\tb\nc", "___", "김철수 2026"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
            assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn filename_charset_is_restricted() {
        let name = report_filename("Zoë / Ñandú", "FY26 H1: \"final\"", date(), "json");
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'));
        // 날짜의 '-' 외에는 [A-Za-z0-9_.]만 사용
        let without_date = name.replace("2026-10-15", "");
        assert!(without_date
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'));
    }
}
