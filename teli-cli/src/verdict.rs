//! Sources of pairwise verdicts for ranking sessions.

use std::io::{BufRead, Write};

use teli_core::{ComparisonOutcome, ItemId, ItemMetadata, RankedItem};

use crate::CliError;

/// Parse a verdict token.
///
/// `1` prefers the item being ranked, `=` calls it even and `2` prefers the
/// item already in the collection. Spelled-out outcomes such as
/// `prefer-new` are accepted too.
pub(crate) fn parse_verdict(token: &str) -> Result<ComparisonOutcome, CliError> {
    match token.trim() {
        "1" => Ok(ComparisonOutcome::PreferNew),
        "=" => Ok(ComparisonOutcome::Equal),
        "2" => Ok(ComparisonOutcome::PreferExisting),
        other => other.parse().map_err(|_| CliError::InvalidVerdict {
            token: other.to_owned(),
        }),
    }
}

/// Parse a comma- or whitespace-separated list of verdict tokens.
pub(crate) fn parse_verdict_list(raw: &str) -> Result<Vec<ComparisonOutcome>, CliError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(parse_verdict)
        .collect()
}

/// Describes one pending comparison.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matchup<'a> {
    /// Label of the item being ranked.
    pub(crate) newcomer: &'a str,
    /// Opponent drawn from the collection.
    pub(crate) opponent: &'a RankedItem,
    /// Zero-based position of this comparison.
    pub(crate) index: usize,
    /// Total comparisons in the session.
    pub(crate) total: usize,
}

/// Supplies verdicts for ranking sessions.
pub(crate) trait VerdictSource {
    fn next_verdict(
        &mut self,
        matchup: Matchup<'_>,
        out: &mut dyn Write,
    ) -> Result<ComparisonOutcome, CliError>;
}

/// Verdicts fixed up front, typically from `--verdicts`.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedVerdicts {
    verdicts: std::vec::IntoIter<ComparisonOutcome>,
    supplied: usize,
}

impl ScriptedVerdicts {
    pub(crate) fn new(verdicts: Vec<ComparisonOutcome>) -> Self {
        Self {
            supplied: verdicts.len(),
            verdicts: verdicts.into_iter(),
        }
    }

    /// Verdicts not consumed so far.
    pub(crate) fn unused(&self) -> usize {
        self.verdicts.len()
    }
}

impl VerdictSource for ScriptedVerdicts {
    fn next_verdict(
        &mut self,
        matchup: Matchup<'_>,
        out: &mut dyn Write,
    ) -> Result<ComparisonOutcome, CliError> {
        let verdict = self.verdicts.next().ok_or(CliError::VerdictsExhausted {
            supplied: self.supplied,
        })?;
        writeln!(
            out,
            "[{}/{}] {} vs {}: {verdict}",
            matchup.index + 1,
            matchup.total,
            matchup.newcomer,
            item_label(matchup.opponent),
        )
        .map_err(CliError::WriteOutput)?;
        Ok(verdict)
    }
}

/// Prompts for each verdict on a line-oriented reader.
///
/// Unrecognised answers are reported and the question is asked again.
pub(crate) struct PromptVerdicts<R> {
    input: R,
}

impl<R: BufRead> PromptVerdicts<R> {
    pub(crate) const fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> VerdictSource for PromptVerdicts<R> {
    fn next_verdict(
        &mut self,
        matchup: Matchup<'_>,
        out: &mut dyn Write,
    ) -> Result<ComparisonOutcome, CliError> {
        loop {
            write!(
                out,
                "[{}/{}] Which is better? 1) {}  =) same  2) {} > ",
                matchup.index + 1,
                matchup.total,
                matchup.newcomer,
                item_label(matchup.opponent),
            )
            .map_err(CliError::WriteOutput)?;
            out.flush().map_err(CliError::WriteOutput)?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(CliError::ReadInput)?;
            if read == 0 {
                return Err(CliError::InputClosed);
            }
            match parse_verdict(&line) {
                Ok(verdict) => return Ok(verdict),
                Err(err) => writeln!(out, "{err}").map_err(CliError::WriteOutput)?,
            }
        }
    }
}

/// Human-readable label for an item: its title when known, else `#id`.
pub(crate) fn item_label(item: &RankedItem) -> String {
    metadata_label(item.id, &item.metadata)
}

pub(crate) fn metadata_label(id: ItemId, metadata: &ItemMetadata) -> String {
    match (&metadata.title, metadata.year) {
        (Some(title), Some(year)) => format!("{title} ({year})"),
        (Some(title), None) => title.clone(),
        (None, _) => format!("#{id}"),
    }
}
