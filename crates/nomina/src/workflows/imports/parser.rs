use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One CSV row with its source line, still in raw token form.
#[derive(Debug)]
pub(crate) struct IncidenceRow {
    pub(crate) line: usize,
    pub(crate) id: Option<String>,
    pub(crate) employee_id: String,
    pub(crate) period_id: String,
    pub(crate) category: String,
    pub(crate) effect: String,
    pub(crate) method: Option<String>,
    pub(crate) quantity: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) status: String,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<IncidenceRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = record?;
        rows.push(IncidenceRow {
            // header is line 1
            line: index + 2,
            id: raw.id,
            employee_id: raw.employee_id,
            period_id: raw.period_id,
            category: raw.category,
            effect: raw.effect,
            method: raw.method,
            quantity: raw.quantity,
            amount: raw.amount,
            status: raw.status,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    employee_id: String,
    period_id: String,
    category: String,
    effect: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    method: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    quantity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    amount: Option<String>,
    status: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
