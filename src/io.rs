/**
 * SgdReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

extern crate serde_json;

use std;
use std::io;
use std::io::prelude::*;
use std::io::stdout;
use std::fs::File;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use error::{Error, Result};
use types::Rating;
use EpochReport;

/// Reads ratings from a stream of whitespace separated `user item score timestamp` tuples. Line
/// breaks carry no meaning, the timestamp is parsed but discarded. The stream must end after a
/// complete tuple. Scores and timestamps must be finite, `nan` or `inf` are rejected.
pub fn read_ratings<R>(mut reader: R) -> Result<Vec<Rating>> where R: std::io::Read {

    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;

    let mut tokens = Tokens { inner: contents.split_whitespace(), position: 0 };
    let mut ratings = Vec::new();

    while let Some(user) = tokens.next_parsed::<u32>()? {
        let item = tokens.expect_parsed::<u32>()?;
        let score = tokens.expect_finite()?;
        let _timestamp = tokens.expect_finite()?;

        ratings.push(Rating::new(user, item, score));
    }

    Ok(ratings)
}

/// Reads the ratings stored at `path`. An empty path or a file which cannot be opened is reported
/// as missing input, so that nothing downstream runs with zero-valued dimensions.
pub fn read_ratings_from_file(path: &str, what: &str) -> Result<Vec<Rating>> {

    if path.is_empty() {
        return Err(Error::MissingInput(format!("{} file not specified", what)));
    }

    let file = File::open(&Path::new(path))
        .map_err(|cause| Error::MissingInput(format!("{} file {}: {}", what, path, cause)))?;

    read_ratings(io::BufReader::new(file))
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {

    fn next_parsed<T: FromStr>(&mut self) -> Result<Option<T>> {
        match self.inner.next() {
            Some(token) => {
                let position = self.position;
                self.position += 1;
                token.parse::<T>()
                    .map(Some)
                    .map_err(|_| Error::Parse { token: token.to_owned(), position })
            },
            None => Ok(None),
        }
    }

    fn expect_parsed<T: FromStr>(&mut self) -> Result<T> {
        let position = self.position;
        match self.next_parsed::<T>()? {
            Some(value) => Ok(value),
            None => Err(Error::Parse { token: String::new(), position }),
        }
    }

    fn expect_finite(&mut self) -> Result<f64> {
        let position = self.position;
        let value = self.expect_parsed::<f64>()?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::Parse { token: value.to_string(), position })
        }
    }
}

/// Output the per-epoch metrics in JSON format, one object per line. If a `reports_path` is
/// supplied, we write to a file at the specified path, otherwise, we output to stdout.
pub fn write_reports(reports: &[EpochReport], reports_path: Option<String>) -> io::Result<()> {

    let out: Box<dyn Write> = match reports_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout())
    };

    write_reports_to(reports, out)
}

fn write_reports_to<W: Write>(reports: &[EpochReport], mut out: W) -> io::Result<()> {

    for report in reports.iter() {
        let report_as_json = serde_json::to_string(report)
            .map_err(|cause| io::Error::new(io::ErrorKind::InvalidData, cause))?;

        write!(out, "{}\n", report_as_json)?;
    }

    out.flush()
}
