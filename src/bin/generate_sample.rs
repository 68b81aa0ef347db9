use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One generated student record.
struct Student {
    sr_no: i64,
    reg_no: String,
    name: String,
    gender: &'static str,
    course: String,
    department: &'static str,
    status: &'static str,
    company: Option<&'static str>,
    ctc: Option<f64>,
    backlogs: i64,
}

const FIRST: &[&str] = &["Asha", "Ravi", "Meera", "Arjun", "Kavya", "Rohan", "Isha", "Vikram"];
const LAST: &[&str] = &["Sharma", "Iyer", "Patel", "Reddy", "Nair", "Gupta", "Das"];
const COURSES: &[&str] = &["B.Tech CSE", "B.Tech ECE", "B.Tech ME", "MBA", "MCA"];
const DEPARTMENTS: &[&str] = &["Engineering", "Management", "Computer Applications"];
const COMPANIES: &[&str] = &["Infosys", "TCS", "Wipro", "Accenture", "Deloitte", "Zoho"];

fn generate(rng: &mut SimpleRng, count: i64) -> Vec<Student> {
    (1..=count)
        .map(|sr_no| {
            let placed = rng.chance(0.55);
            let mut course = rng.pick(COURSES).to_string();
            // Messy input on purpose: stray whitespace and case variants.
            if rng.chance(0.05) {
                course = format!(" {course} ");
            } else if rng.chance(0.05) {
                course = course.to_uppercase();
            }
            Student {
                sr_no,
                reg_no: format!("REG{:05}", 1000 + sr_no),
                name: format!("{} {}", rng.pick(FIRST), rng.pick(LAST)),
                gender: if rng.chance(0.5) { "Female" } else { "Male" },
                course,
                department: rng.pick(DEPARTMENTS),
                status: if placed {
                    "Placed"
                } else if rng.chance(0.3) {
                    "Not Interested"
                } else {
                    "Open"
                },
                company: placed.then(|| rng.pick(COMPANIES)),
                ctc: placed.then(|| (3.0 + rng.next_f64() * 9.0 * 10.0).round() / 10.0),
                backlogs: (rng.next_u64() % 4) as i64,
            }
        })
        .collect()
}

fn write_parquet(students: &[Student], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sr_no", DataType::Int64, false),
        Field::new("reg_no", DataType::Utf8, false),
        Field::new("student_name", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("course", DataType::Utf8, false),
        Field::new("department", DataType::Utf8, false),
        Field::new("status", DataType::Utf8, false),
        Field::new("company_name", DataType::Utf8, true),
        Field::new("ctc", DataType::Float64, true),
        Field::new("backlogs", DataType::Int64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(students.iter().map(|s| s.sr_no))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| &s.reg_no))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| &s.name))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| s.gender))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| &s.course))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| s.department))),
        Arc::new(StringArray::from_iter_values(students.iter().map(|s| s.status))),
        Arc::new(StringArray::from(
            students.iter().map(|s| s.company).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            students.iter().map(|s| s.ctc).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from_iter_values(students.iter().map(|s| s.backlogs))),
    ];

    let batch =
        RecordBatch::try_new(schema.clone(), columns).context("Failed to create RecordBatch")?;
    let file = std::fs::File::create(path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn write_json(students: &[Student], path: &str) -> Result<()> {
    let records: Vec<JsonValue> = students
        .iter()
        .map(|s| {
            let mut obj = Map::new();
            obj.insert("sr_no".into(), s.sr_no.into());
            obj.insert("reg_no".into(), s.reg_no.clone().into());
            obj.insert("student_name".into(), s.name.clone().into());
            obj.insert("gender".into(), s.gender.into());
            obj.insert("course".into(), s.course.clone().into());
            obj.insert("department".into(), s.department.into());
            obj.insert("status".into(), s.status.into());
            obj.insert("company_name".into(), s.company.into());
            obj.insert("ctc".into(), s.ctc.into());
            obj.insert("backlogs".into(), s.backlogs.into());
            JsonValue::Object(obj)
        })
        .collect();
    let text = serde_json::to_string_pretty(&records)?;
    std::fs::write(path, text).with_context(|| format!("writing {path}"))
}

fn write_csv(students: &[Student], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "sr_no",
        "reg_no",
        "student_name",
        "gender",
        "course",
        "department",
        "status",
        "company_name",
        "ctc",
        "backlogs",
    ])?;
    for s in students {
        writer.write_record([
            s.sr_no.to_string(),
            s.reg_no.clone(),
            s.name.clone(),
            s.gender.to_string(),
            s.course.clone(),
            s.department.to_string(),
            s.status.to_string(),
            s.company.unwrap_or_default().to_string(),
            s.ctc.map(|c| c.to_string()).unwrap_or_default(),
            s.backlogs.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let students = generate(&mut rng, 300);

    write_parquet(&students, "sample_roster.parquet")?;
    write_json(&students, "sample_roster.json")?;
    write_csv(&students, "sample_roster.csv")?;

    println!(
        "Wrote {} students to sample_roster.{{parquet,json,csv}}",
        students.len()
    );
    Ok(())
}
