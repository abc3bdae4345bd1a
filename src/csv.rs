use std::io;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::AmountError;
use crate::{Amount, Command, Loan, LoanId, OwnerKey};

/// Errors that can occur when parsing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command type '{command}'")]
    UnrecognizedType { line: usize, command: String },

    #[error("line {line}: {command} missing {field}")]
    MissingField {
        line: usize,
        command: String,
        field: &'static str,
    },

    #[error("line {line}: {source}")]
    InvalidAmount { line: usize, source: AmountError },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    loan: Option<LoanId>,
    owner: Option<OwnerKey>,
    amount: Option<String>,
    term: Option<u32>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    loan: LoanId,
    owner: &'a str,
    status: String,
    principal: String,
    balance: String,
    due_date: Option<NaiveDate>,
    payment_status: Option<String>,
    amount: Option<String>,
}

impl InputRow {
    fn into_command(self, line: usize) -> Result<Command, CsvError> {
        let missing = |command: &str, field| CsvError::MissingField {
            line,
            command: command.to_string(),
            field,
        };
        let parse_amount = |raw: String| {
            raw.parse::<Amount>()
                .map_err(|source| CsvError::InvalidAmount { line, source })
        };

        match self.r#type.as_str() {
            "create" => Ok(Command::Create {
                owner: self.owner.ok_or_else(|| missing("create", "owner"))?,
                principal: parse_amount(self.amount.ok_or_else(|| missing("create", "amount"))?)?,
                term: self.term.ok_or_else(|| missing("create", "term"))?,
                start_date: self.date.ok_or_else(|| missing("create", "date"))?,
            }),
            "approve" => Ok(Command::Approve {
                loan: self.loan.ok_or_else(|| missing("approve", "loan"))?,
            }),
            "repay" => Ok(Command::Repay {
                loan: self.loan.ok_or_else(|| missing("repay", "loan"))?,
                owner: self.owner.ok_or_else(|| missing("repay", "owner"))?,
                amount: parse_amount(self.amount.ok_or_else(|| missing("repay", "amount"))?)?,
                date: self.date.ok_or_else(|| missing("repay", "date"))?,
            }),
            other => Err(CsvError::UnrecognizedType {
                line,
                command: other.to_string(),
            }),
        }
    }
}

/// Read commands from csv input with a `type,loan,owner,amount,term,date` header
pub fn read_commands<R: io::Read>(reader: R) -> impl Iterator<Item = Result<Command, CsvError>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_command(line)
        })
}

/// Write the loan book in csv format, one row per installment
pub fn write_loans<'a>(
    writer: impl io::Write,
    loans: impl IntoIterator<Item = &'a Loan>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for loan in loans {
        let row = |payment: Option<&crate::Payment>| OutputRow {
            loan: loan.id(),
            owner: loan.owner(),
            status: loan.status().to_string(),
            principal: loan.principal().to_string(),
            balance: loan.remaining_balance().to_string(),
            due_date: payment.map(|p| p.due_date),
            payment_status: payment.map(|p| p.status.to_string()),
            amount: payment.map(|p| p.amount.to_string()),
        };

        if loan.payments().is_empty() {
            writer.serialize(row(None))?;
        }
        for payment in loan.payments() {
            writer.serialize(row(Some(payment)))?;
        }
    }

    writer.flush()?;
    Ok(())
}
