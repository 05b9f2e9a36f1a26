use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 6] = ["type", "student", "product", "installment", "date", "reference"];

pub fn write_operations(path: &Path, rows: &[[&str; 6]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Enrolls `students` students, cycling through the three products.
pub fn generate_enrollments(path: &Path, students: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    let products = ["scholarship", "mandarin", "english"];
    for i in 1..=students {
        wtr.write_record([
            "enroll",
            &format!("stu-{i}"),
            products[i % products.len()],
            "",
            "2024-01-01",
            "",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
