#![allow(dead_code)]
use std::path::Path;

use mython::ast::Statement;
use mython::lexer::Lexer;
use mython::parser;
use test_support::load_fixtures;

/// Bench workloads: every fixture whose spec tags it for benching.
pub fn workloads() -> Vec<(String, String)> {
    load_fixtures(Path::new("tests/programs"))
        .expect("load fixtures")
        .into_iter()
        .filter(|fixture| fixture.is_benched())
        .map(|fixture| (fixture.name, fixture.source))
        .collect()
}

pub fn parse_program(source: &str) -> Statement {
    let lexer = Lexer::new(source).expect("lexer should start");
    parser::parse(lexer).expect("parse bench program")
}
