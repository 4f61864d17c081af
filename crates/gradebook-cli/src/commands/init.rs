//! The `gradebook init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("gradebook.toml").exists() {
        println!("gradebook.toml already exists, skipping.");
    } else {
        std::fs::write("gradebook.toml", SAMPLE_CONFIG)?;
        println!("Created gradebook.toml");
    }

    if std::path::Path::new("gradebook.json").exists() {
        println!("gradebook.json already exists, skipping.");
    } else {
        std::fs::write("gradebook.json", SAMPLE_GRADEBOOK)?;
        println!("Created gradebook.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: gradebook check --data gradebook.json");
    println!("  2. Run: gradebook summary --data gradebook.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradebook configuration

# "warn" logs scores outside a category's bounds, "reject" refuses them.
bound_policy = "warn"
max_cascade_depth = 4096
record_events = true

[removal]
# What happens to an evaluation when its student or category is removed:
# "delete" drops it from the gradebook, "detach" only clears the link.
students = "delete"
categories = "detach"
"#;

const SAMPLE_GRADEBOOK: &str = r#"{
  "saved_at": "2025-01-01T00:00:00Z",
  "students": [
    {
      "id": "6c1b2f0e-3a55-4d0c-9a7e-1f2d3c4b5a60",
      "first_name": "Ada",
      "last_name": "Lovelace"
    },
    {
      "id": "0e4a9d12-7b3c-4f1e-8d2a-5c6b7a8f9e01",
      "first_name": "Alan",
      "last_name": "Turing"
    }
  ],
  "categories": [
    {
      "id": "b7d2c4e6-1f3a-4b5c-9d8e-7f6a5b4c3d21",
      "name": "Homework",
      "min_points": 0.0,
      "max_points": 10.0
    },
    {
      "id": "2f8e6d4c-5b3a-4918-8e7d-6c5b4a392817",
      "name": "Exam",
      "min_points": 0.0,
      "max_points": 50.0
    }
  ],
  "evaluations": [
    {
      "id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d",
      "points": 9.5,
      "reason": "neat proof",
      "student": "6c1b2f0e-3a55-4d0c-9a7e-1f2d3c4b5a60",
      "category": "b7d2c4e6-1f3a-4b5c-9d8e-7f6a5b4c3d21"
    },
    {
      "id": "1d2c3b4a-5f6e-4d7c-8b9a-0f1e2d3c4b5a",
      "points": 42.0,
      "student": "6c1b2f0e-3a55-4d0c-9a7e-1f2d3c4b5a60",
      "category": "2f8e6d4c-5b3a-4918-8e7d-6c5b4a392817"
    },
    {
      "id": "7e6f5a4b-3c2d-4e1f-9a0b-8c7d6e5f4a3b",
      "student": "0e4a9d12-7b3c-4f1e-8d2a-5c6b7a8f9e01",
      "category": "b7d2c4e6-1f3a-4b5c-9d8e-7f6a5b4c3d21"
    }
  ]
}
"#;
