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

extern crate sgdreco;
extern crate num_cpus;
extern crate getopts;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::env;
use std::error::Error;
use std::process;
use std::str::FromStr;

use getopts::{Matches, Options};

use sgdreco::Trainer;
use sgdreco::config::{self, Config};
use sgdreco::io;

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("t", "train", "Training file name (required). The input consists of ratings \
        of users for items, one `user item score timestamp` tuple per line, separated by \
        whitespace.", "PATH");
    opts.optopt("e", "test", "Evaluation file name (required), in the same format as the \
        training file.", "PATH");
    opts.optopt("f", "factors", "Number of latent factors per user and item (required).",
        "NUMBER");
    opts.optopt("n", "iterations", "Number of training epochs (required).", "NUMBER");
    opts.optopt("a", "alpha", &format!("Learning rate (optional, defaults to {}).",
        config::DEFAULT_ALPHA), "NUMBER");
    opts.optopt("l", "lambda", &format!("Regularization (optional, defaults to {}).",
        config::DEFAULT_LAMBDA), "NUMBER");
    opts.optopt("", "min", &format!("Smallest valid rating (optional, defaults to {}).",
        config::DEFAULT_RANGE_MIN), "NUMBER");
    opts.optopt("", "max", &format!("Largest valid rating (optional, defaults to {}).",
        config::DEFAULT_RANGE_MAX), "NUMBER");
    opts.optopt("s", "seed", "Seed for the initialization of the latent factors (optional, \
        drawn at random by default).", "NUMBER");
    opts.optopt("j", "threads", "Number of threads to train with, or 'auto' to use all CPUs \
        (optional, defaults to 1 which runs the sequential reference implementation).",
        "NUMBER");
    opts.optopt("o", "outputfile", "Output file name for the per-epoch metrics (optional, \
        output will be written to stdout by default).", "PATH");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage(&program, opts, None);
    }

    if !matches.opt_present("t") || !matches.opt_present("e") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a training file via --train and an evaluation file via --test."),
        );
    }

    let config = match parse_config(&matches) {
        Ok(config) => config,
        Err(hint) => return print_usage_and_exit(&program, opts, Some(&hint)),
    };

    let train_path = matches.opt_str("t").unwrap_or_default();
    let test_path = matches.opt_str("e").unwrap_or_default();
    let reports_path = matches.opt_str("o");

    if let Err(failure) = train(&config, &train_path, &test_path, reports_path) {
        error!("{}", failure);
        process::exit(1);
    }
}

fn parse_config(matches: &Matches) -> Result<Config, String> {

    let num_threads = match matches.opt_str("j") {
        Some(ref threads) if threads == "auto" => num_cpus::get(),
        Some(threads) => parse_number("j", &threads)?,
        None => 1,
    };

    Ok(Config {
        num_factors: optional("f", matches)?,
        num_iterations: optional("n", matches)?,
        alpha: with_default("a", matches, config::DEFAULT_ALPHA)?,
        lambda: with_default("l", matches, config::DEFAULT_LAMBDA)?,
        range_min: with_default("min", matches, config::DEFAULT_RANGE_MIN)?,
        range_max: with_default("max", matches, config::DEFAULT_RANGE_MAX)?,
        num_threads,
        seed: optional("s", matches)?,
    })
}

fn optional<T>(name: &str, matches: &Matches) -> Result<Option<T>, String>
    where T: FromStr, T::Err: Error {
    matches.opt_get(name)
        .map_err(|failure: T::Err| format!("Problem with option '{}': {}", name, failure.to_string()))
}

fn with_default<T>(name: &str, matches: &Matches, default: T) -> Result<T, String>
    where T: FromStr, T::Err: Error {
    matches.opt_get_default(name, default)
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure.to_string()))
}

fn parse_number(name: &str, value: &str) -> Result<usize, String> {
    value.parse::<usize>()
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure.to_string()))
}

fn print_usage(program: &str, opts: Options, hint: Option<&str>) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    print_usage(program, opts, hint);
    process::exit(2);
}

fn train(
    config: &Config,
    train_path: &str,
    test_path: &str,
    reports_path: Option<String>,
) -> Result<(), Box<dyn Error>> {

    let mut trainer = Trainer::from_files(config, train_path, test_path)?;
    let reports = trainer.run()?;

    info!("Writing metrics of {} epochs...", reports.len());
    io::write_reports(&reports, reports_path)?;

    Ok(())
}
