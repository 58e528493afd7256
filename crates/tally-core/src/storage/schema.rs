pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS eval_groups (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  model TEXT NOT NULL,
  generic_prompt TEXT,
  version INTEGER NOT NULL,
  duration REAL NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evals (
  id TEXT PRIMARY KEY,
  input TEXT NOT NULL,
  output TEXT NOT NULL,
  expected TEXT,
  formatted_input TEXT,
  formatted_output TEXT,
  score REAL NOT NULL,
  formatted_score TEXT,
  duration REAL NOT NULL DEFAULT 0,
  input_finger_print TEXT NOT NULL,
  eval_group_id TEXT NOT NULL REFERENCES eval_groups(id),
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS eval_group_threshold (
  id TEXT PRIMARY KEY REFERENCES eval_groups(id),
  good_score REAL NOT NULL,
  average_score REAL NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS input_finger_print_idx ON evals(input_finger_print);
CREATE INDEX IF NOT EXISTS eval_groups_name_idx ON eval_groups(name, version);
"#;
