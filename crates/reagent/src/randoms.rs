//! Random number tools used by the demo conversations and the tools server.
use rand::Rng;
use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;
use crate::registry::ToolRegistry;

pub const MULTIPLIED_TOOL: &str = "generate_random_multiplied";
pub const DIVIDED_TOOL: &str = "generate_random_divided";

fn range_schema(operand: &str, operand_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "minimum": {
                "type": "string",
                "description": "Minimum range value for random number generation",
            },
            "maximum": {
                "type": "string",
                "description": "Maximum range value for random number generation",
            },
            operand: {
                "type": "string",
                "description": operand_description,
            },
        },
        "required": ["minimum", "maximum", operand],
    })
}

pub fn multiplied_tool() -> Tool {
    Tool::new(
        MULTIPLIED_TOOL,
        "Use this function to get random number in given range, miltiplied by given number.",
        range_schema("multiplier", "Multiplier for the resulting return value "),
    )
}

pub fn divided_tool() -> Tool {
    Tool::new(
        DIVIDED_TOOL,
        "Use this function to get random number in given range, divided by given number.",
        range_schema("divisor", "Divisor for the resulting return value "),
    )
}

/// A registry holding both random number tools
pub fn registry() -> AgentResult<ToolRegistry> {
    ToolRegistry::new()
        .with_tool(multiplied_tool(), |args| {
            generate_random_multiplied(
                &argument(args, "minimum")?,
                &argument(args, "maximum")?,
                &argument(args, "multiplier")?,
            )
        })?
        .with_tool(divided_tool(), |args| {
            generate_random_divided(
                &argument(args, "minimum")?,
                &argument(args, "maximum")?,
                &argument(args, "divisor")?,
            )
        })
}

/// Pick a random integer in `[minimum, maximum]` and multiply it
pub fn generate_random_multiplied(
    minimum: &str,
    maximum: &str,
    multiplier: &str,
) -> AgentResult<Value> {
    let factor = parse_integer("multiplier", multiplier)?;
    let random_number = random_in_range(minimum, maximum)?;
    let result = random_number.checked_mul(factor).ok_or_else(|| {
        AgentError::ExecutionError(format!("{} * {} overflows", random_number, factor))
    })?;

    Ok(json!({
        "random_number": random_number,
        "multiplier": multiplier,
        "result": result,
    }))
}

/// Pick a random integer in `[minimum, maximum]` and divide it (true division)
pub fn generate_random_divided(minimum: &str, maximum: &str, divisor: &str) -> AgentResult<Value> {
    let denominator = parse_integer("divisor", divisor)?;
    if denominator == 0 {
        return Err(AgentError::ExecutionError("division by zero".to_string()));
    }
    let random_number = random_in_range(minimum, maximum)?;
    let result = random_number as f64 / denominator as f64;

    Ok(json!({
        "random_number": random_number,
        "divisor": divisor,
        "result": result,
    }))
}

// Models sometimes send numbers where the schema asks for strings
fn argument(args: &Value, name: &str) -> AgentResult<String> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(AgentError::InvalidParameters(format!(
            "{} must be a string, got {}",
            name, other
        ))),
        None => Err(AgentError::InvalidParameters(format!(
            "{} parameter required",
            name
        ))),
    }
}

fn parse_integer(name: &str, value: &str) -> AgentResult<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        AgentError::InvalidParameters(format!("{} must be an integer, got '{}'", name, value))
    })
}

fn random_in_range(minimum: &str, maximum: &str) -> AgentResult<i64> {
    let low = parse_integer("minimum", minimum)?;
    let high = parse_integer("maximum", maximum)?;
    if low > high {
        return Err(AgentError::InvalidParameters(format!(
            "minimum {} is greater than maximum {}",
            low, high
        )));
    }
    Ok(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplied() -> AgentResult<()> {
        for _ in 0..50 {
            let value = generate_random_multiplied("1", "10", "6")?;
            let random_number = value["random_number"].as_i64().unwrap();
            assert!((1..=10).contains(&random_number));
            assert_eq!(value["result"].as_i64().unwrap(), random_number * 6);
            assert_eq!(value["multiplier"], json!("6"));
        }
        Ok(())
    }

    #[test]
    fn test_divided_is_true_division() -> AgentResult<()> {
        for _ in 0..50 {
            let value = generate_random_divided("65", "81", "3")?;
            let random_number = value["random_number"].as_i64().unwrap();
            assert!((65..=81).contains(&random_number));
            assert!(value["result"].is_f64());
            assert_eq!(value["result"].as_f64().unwrap(), random_number as f64 / 3.0);
            assert_eq!(value["divisor"], json!("3"));
        }
        Ok(())
    }

    #[test]
    fn test_single_value_range() -> AgentResult<()> {
        let value = generate_random_multiplied("4", "4", "2")?;
        assert_eq!(value["random_number"], json!(4));
        assert_eq!(value["result"], json!(8));
        Ok(())
    }

    #[test]
    fn test_failures_are_reported() {
        assert_eq!(
            generate_random_divided("1", "10", "0"),
            Err(AgentError::ExecutionError("division by zero".into()))
        );
        assert!(matches!(
            generate_random_multiplied("one", "10", "6"),
            Err(AgentError::InvalidParameters(_))
        ));
        assert!(matches!(
            generate_random_multiplied("10", "1", "6"),
            Err(AgentError::InvalidParameters(_))
        ));
        assert!(matches!(
            generate_random_multiplied("2", "10", &i64::MAX.to_string()),
            Err(AgentError::ExecutionError(_))
        ));
    }

    #[test]
    fn test_tool_descriptions_are_served_verbatim() {
        let multiplied = multiplied_tool();
        assert_eq!(
            multiplied.description.as_deref(),
            Some("Use this function to get random number in given range, miltiplied by given number.")
        );
        assert_eq!(
            multiplied.input_schema["properties"]["multiplier"]["description"],
            json!("Multiplier for the resulting return value ")
        );
        assert_eq!(
            divided_tool().input_schema["properties"]["divisor"]["description"],
            json!("Divisor for the resulting return value ")
        );
        assert_eq!(
            divided_tool().input_schema["required"],
            json!(["minimum", "maximum", "divisor"])
        );
    }

    #[test]
    fn test_registry_dispatch() -> AgentResult<()> {
        let registry = registry()?;
        let names: Vec<_> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![MULTIPLIED_TOOL, DIVIDED_TOOL]);

        let value = registry.call(
            MULTIPLIED_TOOL,
            &json!({"minimum": "2", "maximum": "2", "multiplier": 5}),
        )?;
        assert_eq!(value["result"], json!(10));
        assert_eq!(value["multiplier"], json!("5"));

        assert!(matches!(
            registry.call(DIVIDED_TOOL, &json!({"minimum": "1", "maximum": "2"})),
            Err(AgentError::InvalidParameters(_))
        ));
        Ok(())
    }
}
