use super::product::ProductType;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Registers the student into a product and generates its installments.
    Enroll,
    /// Attaches a proof of payment to an installment.
    Proof,
    /// Staff confirmation; `reference` names the staff member.
    Validate,
    /// Staff refusal of the attached proof; `reference` is the reason.
    Reject,
}

/// One staff action read from an operations file.
///
/// Installments are addressed by `(student, product, installment)`; the
/// `date` is the enrollment date for `enroll` and the action date otherwise.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Operation {
    pub r#type: OperationType,
    pub student: String,
    pub product: ProductType,
    pub installment: Option<u8>,
    pub date: NaiveDate,
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_deserialization() {
        let csv = "type, student, product, installment, date, reference\n\
                   enroll, stu-1, mandarin, , 2024-01-01,\n\
                   validate, stu-1, mandarin_course, 2, 2024-01-05, staff-7";
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());
        let ops: Vec<Operation> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("Failed to deserialize operations");

        assert_eq!(ops[0].r#type, OperationType::Enroll);
        assert_eq!(ops[0].product, ProductType::MandarinCourse);
        assert_eq!(ops[0].installment, None);
        assert_eq!(ops[0].reference, None);

        assert_eq!(ops[1].r#type, OperationType::Validate);
        assert_eq!(ops[1].installment, Some(2));
        assert_eq!(ops[1].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(ops[1].reference.as_deref(), Some("staff-7"));
    }
}
