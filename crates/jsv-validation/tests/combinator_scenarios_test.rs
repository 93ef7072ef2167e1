//! Combinator scoring and error ordering against a schema that mixes
//! `oneOf`, `anyOf` and `allOf` branches which all forbid additional
//! properties.

use jsv_ir::Value;
use jsv_schema::{Compiler, Schema};
use jsv_validation::ValidationEngine;

const MIXED_COMBINATOR_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-04/schema#",
    "type": "object",
    "oneOf": [
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"A": {"type": "number"}},
            "required": ["A"]
        },
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"B": {"type": "number"}},
            "required": ["B"]
        }
    ],
    "anyOf": [
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"C": {"type": "number"}},
            "required": ["C"]
        },
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"D": {"type": "number"}},
            "required": ["D"]
        },
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "G": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"A": {"type": "number"}},
                    "required": ["A"]
                }
            },
            "required": ["G"]
        }
    ],
    "allOf": [
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"E": {"type": "number"}},
            "required": ["E"]
        },
        {
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "additionalProperties": false,
            "properties": {"F": {"type": "number"}},
            "required": ["F"]
        }
    ]
}"#;

struct Scenario {
    description: &'static str,
    document: &'static str,
    valid: bool,
    score: i64,
    errors: &'static [&'static str],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        description: "valid document",
        document: r#"{"A":1,"C":3,"D":4,"E":5,"F":6,"G":{"A":71}}"#,
        valid: true,
        score: 22,
        errors: &[],
    },
    Scenario {
        description: "field overlap inside a failed anyOf branch",
        document: r#"{"A":1,"C":3,"D":4,"E":5,"F":6,"G":{"C":73}}"#,
        valid: false,
        score: 21,
        errors: &[
            "(root): Must validate one and only one schema (oneOf)",
            "(root): Additional property G is not allowed",
            "(root): Additional property G is not allowed",
            "(root): Additional property G is not allowed",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
    Scenario {
        description: "nothing present",
        document: "{}",
        valid: false,
        score: 6,
        errors: &[
            "(root): Must validate at least one schema (anyOf)",
            "(root): C is required",
            "(root): Must validate one and only one schema (oneOf)",
            "(root): A is required",
            "(root): E is required",
            "(root): F is required",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
    Scenario {
        description: "undeclared field Z",
        document: r#"{"A":1,"C":3,"D":4,"E":5,"F":6,"Z":7}"#,
        valid: false,
        score: 20,
        errors: &[
            "(root): Must validate at least one schema (anyOf)",
            "(root): Additional property Z is not allowed",
            "(root): Must validate one and only one schema (oneOf)",
            "(root): Additional property D is not allowed",
            "(root): Additional property Z is not allowed",
            "(root): Additional property D is not allowed",
            "(root): Additional property Z is not allowed",
            "(root): Additional property D is not allowed",
            "(root): Additional property Z is not allowed",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
    Scenario {
        description: "both oneOf branches present",
        document: r#"{"A":1,"B":2,"C":3,"D":4,"E":5,"F":6}"#,
        valid: false,
        score: 21,
        errors: &[
            "(root): Must validate one and only one schema (oneOf)",
            "(root): Additional property B is not allowed",
            "(root): Additional property B is not allowed",
            "(root): Additional property B is not allowed",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
    Scenario {
        description: "neither oneOf branch present",
        document: r#"{"C":3,"D":4,"E":5,"F":6}"#,
        valid: false,
        score: 22,
        errors: &[
            "(root): Must validate one and only one schema (oneOf)",
            "(root): A is required",
        ],
    },
    Scenario {
        description: "no anyOf branch present",
        document: r#"{"A":1,"E":5,"F":6}"#,
        valid: false,
        score: 22,
        errors: &[
            "(root): Must validate at least one schema (anyOf)",
            "(root): C is required",
        ],
    },
    Scenario {
        description: "one allOf branch missing",
        document: r#"{"A":1,"C":3,"D":4,"E":5}"#,
        valid: false,
        score: 13,
        errors: &[
            "(root): F is required",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
    Scenario {
        description: "both allOf branches missing",
        document: r#"{"A":1,"C":3,"D":4}"#,
        valid: false,
        score: 6,
        errors: &[
            "(root): E is required",
            "(root): F is required",
            "(root): Must validate all the schemas (allOf)",
        ],
    },
];

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

fn compile_mixed_schema() -> Schema {
    Compiler::new()
        .compile(&parse(MIXED_COMBINATOR_SCHEMA))
        .unwrap()
}

#[test]
fn test_mixed_combinator_scenarios() {
    let schema = compile_mixed_schema();
    let engine = ValidationEngine::new();

    for scenario in SCENARIOS {
        let result = engine.validate(&schema, &parse(scenario.document));

        assert_eq!(
            result.is_valid(),
            scenario.valid,
            "unexpected validity for {:?}",
            scenario.description
        );
        assert_eq!(
            result.score(),
            scenario.score,
            "unexpected score for {:?}",
            scenario.description
        );
        assert_eq!(
            result.messages(),
            scenario.errors,
            "unexpected errors for {:?}",
            scenario.description
        );
    }
}

#[test]
fn test_validation_is_repeatable() {
    let schema = compile_mixed_schema();
    let engine = ValidationEngine::new();
    let instance = parse(r#"{"A":1,"C":3,"D":4,"E":5,"F":6,"Z":7}"#);

    let first = engine.validate(&schema, &instance);
    let second = engine.validate(&schema, &instance);
    assert_eq!(first, second);
}

#[test]
fn test_shared_schema_across_threads() {
    let schema = std::sync::Arc::new(compile_mixed_schema());

    let handles: Vec<_> = SCENARIOS
        .iter()
        .map(|scenario| {
            let schema = std::sync::Arc::clone(&schema);
            std::thread::spawn(move || {
                let result = ValidationEngine::new().validate(&schema, &parse(scenario.document));
                (scenario.score, result.score())
            })
        })
        .collect();

    for handle in handles {
        let (expected, actual) = handle.join().unwrap();
        assert_eq!(expected, actual);
    }
}
