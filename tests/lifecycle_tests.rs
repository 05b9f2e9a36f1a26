use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn run(lines: &[&str], as_of: &str) -> assert_cmd::assert::Assert {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type, student, product, installment, date, reference").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }

    let mut cmd = Command::new(cargo_bin!("joda-payments"));
    cmd.arg(file.path()).arg("--as-of").arg(as_of);
    cmd.assert()
}

#[test]
fn test_proof_validate_flow() {
    run(
        &[
            "enroll, stu-1, mandarin, , 2024-01-01,",
            "proof, stu-1, mandarin, 3, 2024-01-10, receipts/m3.pdf",
            "validate, stu-1, mandarin, 3, 2024-01-12, staff-2",
        ],
        "2024-01-12",
    )
    .success()
    .stdout(predicate::str::contains(
        "stu-1,mandarin_course,3,50000,paid,2024-01-15,2024-01-12,0,receipts/m3.pdf,staff-2,,",
    ));
}

#[test]
fn test_validate_without_proof_is_refused() {
    run(
        &[
            "enroll, stu-1, english, , 2024-01-01,",
            "validate, stu-1, english, 1, 2024-01-02, staff-1",
        ],
        "2024-01-02",
    )
    .success()
    .stderr(predicate::str::contains("has no proof of payment attached"))
    .stdout(predicate::str::contains(
        "stu-1,english_course,1,10000,pending,2024-01-01,,0,,,,",
    ));
}

#[test]
fn test_paid_is_terminal() {
    run(
        &[
            "enroll, stu-1, scholarship, , 2024-01-01,",
            "proof, stu-1, scholarship, 1, 2024-01-01, receipts/s1.pdf",
            "validate, stu-1, scholarship, 1, 2024-01-02, staff-1",
            "reject, stu-1, scholarship, 1, 2024-01-03, wrong amount",
        ],
        "2024-03-01",
    )
    .success()
    .stderr(predicate::str::contains("cannot reject a paid payment"))
    .stdout(predicate::str::contains(
        "stu-1,scholarship,1,100000,paid,2024-01-01,2024-01-02,0,receipts/s1.pdf,staff-1,,",
    ));
}

#[test]
fn test_reject_demotes_to_overdue() {
    // Scholarship inscription: due 01-01, 3 days of grace, 10000 per day.
    run(
        &[
            "enroll, stu-1, scholarship, , 2024-01-01,",
            "proof, stu-1, scholarship, 1, 2024-01-03, receipts/blurry.jpg",
            "reject, stu-1, scholarship, 1, 2024-01-06, unreadable scan",
        ],
        "2024-01-06",
    )
    .success()
    .stdout(predicate::str::contains(
        "stu-1,scholarship,1,100000,overdue,2024-01-01,,20000,,,unreadable scan,",
    ));
}

#[test]
fn test_duplicate_enrollment_is_ignored() {
    run(
        &[
            "enroll, stu-1, english, , 2024-01-01,",
            "enroll, stu-1, english, , 2024-02-01,",
        ],
        "2024-01-01",
    )
    .success()
    .stderr(predicate::str::contains("already enrolled"))
    .stdout(predicate::str::contains("2024-02-01").not());
}

#[test]
fn test_enroll_with_installment_only_fills_gaps() {
    run(
        &[
            "enroll, stu-1, english, , 2024-01-01,",
            "enroll, stu-1, english, 2, 2024-01-05,",
            "enroll, stu-2, english, 2, 2024-01-05,",
        ],
        "2024-01-05",
    )
    .success()
    .stderr(predicate::str::contains("already has english_course installment 2"))
    .stderr(predicate::str::contains("is not enrolled in english_course"))
    .stdout(predicate::str::contains("stu-2").not());
}

#[test]
fn test_earlier_as_of_keeps_overdue() {
    // Reading the same history at an earlier date after a rejection on 01-06
    // still shows what was derived on 01-06.
    run(
        &[
            "enroll, stu-1, scholarship, , 2024-01-01,",
            "proof, stu-1, scholarship, 1, 2024-01-03, receipts/blurry.jpg",
            "reject, stu-1, scholarship, 1, 2024-01-06, unreadable scan",
        ],
        "2024-01-02",
    )
    .success()
    .stdout(predicate::str::contains(
        "stu-1,scholarship,1,100000,overdue,2024-01-01,,20000,,,unreadable scan,",
    ));
}
