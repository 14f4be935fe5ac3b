//! Remark normalization and recommendation counting

use crate::roster::CandidateRecord;

/// The one WAEC misspelling corrected during normalization
const MISSPELLING: &str = "recomended";
const CORRECTED: &str = "recommended";

/// Normalize a free-text remark: trim, lowercase, fix "recomended".
///
/// No other tokens are altered.
pub fn normalize_remark(value: &str) -> String {
    value.trim().to_lowercase().replace(MISSPELLING, CORRECTED)
}

/// True when a normalized remark reads as a positive recommendation.
///
/// Any remark containing "not" anywhere is excluded, including
/// "recommended, not finalized".
pub fn is_recommended(remark: &str) -> bool {
    remark.contains(CORRECTED) && !remark.contains("not")
}

/// Count records whose remark is a positive recommendation
pub fn count_recommended(records: &[CandidateRecord]) -> usize {
    records.iter().filter(|r| is_recommended(r.remark())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_remark(remark: &str) -> CandidateRecord {
        let mut record = CandidateRecord::new();
        record.insert("remark", remark);
        record
    }

    #[test]
    fn test_normalize_fixes_misspelling() {
        assert_eq!(normalize_remark("RECOMENDED "), "recommended");
        assert_eq!(normalize_remark("  Not Recomended\t"), "not recommended");
    }

    #[test]
    fn test_normalize_leaves_other_tokens() {
        assert_eq!(normalize_remark("Absent"), "absent");
        assert_eq!(normalize_remark("recommended"), "recommended");
        assert_eq!(normalize_remark(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["RECOMENDED ", " Not recomended", "Withheld", "  ", "recommendeD"] {
            let once = normalize_remark(input);
            assert_eq!(normalize_remark(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_count_excludes_any_not() {
        let records = vec![
            record_with_remark("recommended"),
            record_with_remark("not recommended"),
            record_with_remark("recommended for not transfer"),
        ];
        assert_eq!(count_recommended(&records), 1);
    }

    #[test]
    fn test_count_treats_missing_remark_as_empty() {
        let mut record = CandidateRecord::new();
        record.insert("name", "Ada");
        assert_eq!(count_recommended(&[record]), 0);
        assert_eq!(count_recommended(&[]), 0);
    }
}
