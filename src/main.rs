use clap::{arg, crate_version, value_parser, Command};
use std::io::BufRead;
use std::path::PathBuf;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use rustc_hash::FxHashSet;

use rbst::{Key, Rbst};

pub fn open_file<P>(filename: P) -> BufReader<File>
where
    P: AsRef<Path>,
{
    let f = File::open(filename).expect("Couldn't read from file");
    BufReader::new(f)
}

fn main() {
    // Generate a CLI, and get input filename to process
    let params = Command::new("rbst")
        .version(crate_version!())
        .about("Build a randomized binary search tree from the words in a text file, then query an inclusive word range")
        .arg(arg!(-t --tokens <FILE> "A text file containing words").index(1).required(true).value_parser(value_parser!(PathBuf)))
        .arg(arg!(--from <WORD> "Lower bound (inclusive) of the word range to list. Defaults to the smallest key").required(false))
        .arg(arg!(--to <WORD> "Upper bound (inclusive) of the word range to list. Defaults to the greatest key").required(false))
        .arg(arg!(--dump "Print the depth-indented tree listing").required(false))
        .get_matches();
    let input_file = params.get_one::<PathBuf>("tokens").unwrap();

    let re = Regex::new(r"[^\w\s]").unwrap();
    let mut seen = FxHashSet::default();
    let mut tree: Rbst<usize> = Rbst::new();
    let mut position = 0usize;
    let br = open_file(input_file);
    for line in br.lines() {
        for word in line.unwrap().split_whitespace() {
            let clean_word = re.replace_all(word, "").to_lowercase();
            if clean_word.is_empty() {
                continue;
            }
            // first occurrence wins; the token position is the payload
            if seen.insert(clean_word.clone()) {
                tree.insert(clean_word, position);
            }
            position += 1;
        }
    }

    println!("Distinct words: {}", tree.len());
    println!("Tree height: {}", tree.height());

    let from = params.get_one::<String>("from");
    let to = params.get_one::<String>("to");
    if from.is_some() || to.is_some() {
        let lo = from.map_or(Key::from(f64::NEG_INFINITY), |w| Key::from(w.as_str()));
        let hi = to.map_or(Key::Absent, |w| Key::from(w.as_str()));
        tree.for_each_in_range(&lo, &hi, |node| {
            println!("{} (first seen at token {})", node.key(), node.value());
        });
    }
    if params.get_flag("dump") {
        print!("{}", tree.dump());
    }
}
