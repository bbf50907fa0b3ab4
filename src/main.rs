// Blogspot to FictionBook converter.
//
// Reads a full Blogspot Atom export and writes the posts as a single
// FB2 e-book, one section per post, oldest first.

use std::fs::File;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use blogspot2fb2::{BookOptions, Feed, write_book};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("blogspot2fb2")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert a Blogspot Atom export into an FB2 e-book")
        .arg(
            Arg::new("input")
                .help("Atom XML file to read ('-' for stdin)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("FB2 file to write ('-' for stdout)")
                .default_value("-")
                .index(2),
        )
        .arg(
            Arg::new("genre")
                .short('g')
                .long("genre")
                .help("FB2 genre code, may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("lang")
                .short('l')
                .long("lang")
                .help("Book language code")
                .default_value("en"),
        )
        .get_matches();

    let input = matches
        .get_one::<String>("input")
        .expect("input is a required argument");
    let output = matches
        .get_one::<String>("output")
        .expect("output has a default value");

    let genres = match matches.get_many::<String>("genre") {
        Some(values) => values.cloned().collect(),
        None => vec!["ref_ref".to_string()],
    };
    let lang = matches
        .get_one::<String>("lang")
        .expect("lang has a default value")
        .clone();
    let options = BookOptions { genres, lang };

    let xml = read_input(input).with_context(|| format!("failed to read {input}"))?;
    let feed = Feed::parse(&xml).context("failed to parse the Atom feed")?;
    write_output(&feed, &options, output).with_context(|| format!("failed to write {output}"))?;

    Ok(())
}

fn read_input(path: &str) -> io::Result<Vec<u8>> {
    let mut xml = Vec::new();
    if path == "-" {
        io::stdin().lock().read_to_end(&mut xml)?;
    } else {
        File::open(path)?.read_to_end(&mut xml)?;
    }
    Ok(xml)
}

fn write_output(feed: &Feed, options: &BookOptions, path: &str) -> Result<()> {
    if path == "-" {
        let stdout = io::stdout();
        write_book(feed, options, stdout.lock())?;
    } else {
        let mut out = io::BufWriter::new(File::create(path)?);
        write_book(feed, options, &mut out)?;
        out.flush()?;
    }
    Ok(())
}
