// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

// Small REPL-ish driver for the data-binding engine: load a RON file of
// root bindings, then evaluate one `${...}` expression given on argv
// against them. Mirrors preview.rs's "load a file, render one thing"
// shape rather than main.rs's device-output loop, since there is no
// device here.

use std::collections::HashMap;
use std::env;
use std::fs;

use serde::Deserialize;

use uexpr::context::ContextObject;
use uexpr::object::Object;
use uexpr::{compile, eval_with, root_context, session::LogSession};

#[derive(Deserialize)]
#[serde(untagged)]
enum RonValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

fn to_object(value: RonValue) -> Object {
    match value {
        RonValue::Bool(b) => Object::Boolean(b),
        RonValue::Number(n) => Object::Number(n),
        RonValue::Text(s) => Object::string(s),
        RonValue::Null => Object::Null,
    }
}

fn main() {
    env_logger::init();

    let bindings_path = env::args().nth(1).expect("usage: evalcli <bindings.ron> <expression>");
    let expression = env::args().nth(2).expect("usage: evalcli <bindings.ron> <expression>");

    let text = fs::read_to_string(&bindings_path).expect("couldn't read bindings file");
    let bindings: HashMap<String, RonValue> = ron::from_str(&text).expect("couldn't parse bindings file");

    let context = root_context();
    for (name, value) in bindings {
        context.define(name, ContextObject::mutable(to_object(value)));
    }

    let compiled = compile(&context, &expression);
    let result = match &compiled {
        Object::Bytecode(rc) => eval_with(&mut rc.borrow_mut(), &LogSession),
        other => other.clone(),
    };

    println!("{}", result.as_string());
}
