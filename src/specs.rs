//! Built-in example specifications

/// A named specification that ships with the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSpec {
    pub name: &'static str,
    pub specification: &'static str,
}

pub const EXAMPLES: &[ExampleSpec] = &[
    ExampleSpec {
        name: "Python QA Database",
        specification: "Python app that takes user questions and looks them up in a \
database where they are mapped to answers. If there is a close match, it retrieves \
the matched answer. If there isn't, it asks the user to provide an answer and \
stores the question/answer pair in the database.",
    },
    ExampleSpec {
        name: "JavaScript Todo App",
        specification: "JavaScript todo app built with Next.js. Users can add tasks, \
mark them as done, and delete them. Tasks are served by an API route and kept in \
memory on the server. The page lists open tasks first, then completed ones.",
    },
];

/// Look up an example by name, ignoring case
pub fn find_example(name: &str) -> Option<&'static ExampleSpec> {
    EXAMPLES.iter().find(|example| example.name.eq_ignore_ascii_case(name.trim()))
}
