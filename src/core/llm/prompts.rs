//! Prompt construction shared by all scenario providers.

/// Sampling temperature for first drafts
pub const GENERATE_TEMPERATURE: f64 = 0.3;

/// Sampling temperature for corrections
pub const CORRECT_TEMPERATURE: f64 = 0.2;

pub const SYSTEM_PROMPT: &str = r#"You are an expert in PSDL (Patient Scenario Definition Language) v0.3.
Your task is to generate syntactically correct PSDL YAML based on user descriptions.

PSDL STRUCTURE:

scenario: ScenarioName       # CamelCase, no spaces
version: "1.0.0"             # Semantic version
description: "..."           # What this scenario detects

population:                  # Optional: patient selection criteria
  include:
    - age >= 18
  exclude:
    - condition == "excluded"

signals:                     # Clinical data inputs
  SignalName:
    ref: semantic_reference  # Abstract reference (e.g., creatinine, heart_rate)
    expected_unit: unit      # Expected unit (mg/dL, bpm, mmHg, etc.)
    description: "..."

trends:                      # Computed metrics - NUMERIC VALUES ONLY
  trend_name:
    expr: <expression>       # Must produce a number
    description: "..."

logic:                       # Decision rules - COMPARISONS GO HERE
  rule_name:
    when: <condition>        # Comparisons and boolean expressions
    severity: low|medium|high|critical
    description: "..."

EXPRESSION SYNTAX:

WINDOWED OPERATORS (require Signal + window):
  delta(Signal, window)      - Change over time window
  slope(Signal, window)      - Rate of change (unit/time)
  sma(Signal, window)        - Simple moving average
  ema(Signal, window)        - Exponential moving average
  min(Signal, window)        - Minimum value in window
  max(Signal, window)        - Maximum value in window
  count(Signal, window)      - Count of values in window
  first(Signal, window)      - First value in window
  std(Signal, window)        - Standard deviation

POINTWISE OPERATORS (Signal only, no window):
  last(Signal)               - Most recent value
  exists(Signal)             - True if signal has value
  missing(Signal)            - True if signal is missing

WINDOW FORMAT:
  INTEGER + UNIT where unit is: s, m, h, d, w
  Examples: 48h, 24h, 7d, 30m, 1w

COMPARISON OPERATORS (logic layer ONLY):
  ==  !=  <  <=  >  >=

BOOLEAN OPERATORS (MUST be uppercase):
  AND   OR   NOT

NOT SUPPORTED (these will cause validation errors):
- time_since(), time_in_state(), onset(), duration()
- avg()              - Use sma() instead

CRITICAL RULES:
1. TRENDS = computations only. NO comparisons (>=, <=, >, <, ==) in trends!
2. LOGIC = comparisons go here. Reference trend names or other logic rules.
3. Boolean operators MUST be uppercase: AND, OR, NOT
4. Window format is strict: 48h not 48 hours, 7d not 7 days
5. Severity must be one of: low, medium, high, critical
6. Output valid YAML wrapped in ```yaml code blocks"#;

pub const FEW_SHOT_EXAMPLES: &str = r#"
EXAMPLE 1: Acute Kidney Injury Detection
User: "Detect acute kidney injury using creatinine changes over 48 hours"

```yaml
scenario: AKI_Detection
version: "1.0.0"
description: "Detect acute kidney injury based on KDIGO creatinine criteria"

signals:
  Cr:
    ref: creatinine
    expected_unit: mg/dL
    description: "Serum creatinine level"

trends:
  cr_delta_48h:
    expr: delta(Cr, 48h)
    description: "Creatinine change over 48 hours"
  cr_current:
    expr: last(Cr)
    description: "Current creatinine value"

logic:
  aki_stage1:
    when: cr_delta_48h >= 0.3
    severity: medium
    description: "AKI Stage 1: Cr rise >= 0.3 mg/dL in 48h"
  aki_severe:
    when: cr_current >= 4.0
    severity: critical
    description: "Severe AKI: Cr >= 4.0 mg/dL"
  aki_present:
    when: aki_stage1 OR aki_severe
    severity: high
    description: "AKI detected by any criterion"
```

EXAMPLE 2: SIRS/Sepsis Screening
User: "Detect sepsis using temperature, heart rate, and WBC"

```yaml
scenario: SIRS_Sepsis_Screen
version: "1.0.0"
description: "Screen for SIRS criteria suggesting possible sepsis"

signals:
  Temp:
    ref: body_temperature
    expected_unit: C
  HR:
    ref: heart_rate
    expected_unit: bpm
  WBC:
    ref: white_blood_cell_count
    expected_unit: x10^9/L

trends:
  temp_current:
    expr: last(Temp)
  hr_current:
    expr: last(HR)
  wbc_current:
    expr: last(WBC)

logic:
  fever:
    when: temp_current > 38.3
    severity: low
  hypothermia:
    when: temp_current < 36.0
    severity: low
  tachycardia:
    when: hr_current > 90
    severity: low
  leukocytosis:
    when: wbc_current > 12
    severity: low
  leukopenia:
    when: wbc_current < 4
    severity: low
  sirs_criteria:
    when: (fever OR hypothermia) AND tachycardia AND (leukocytosis OR leukopenia)
    severity: high
    description: "Multiple SIRS criteria met - evaluate for sepsis"
```
"#;

/// System prompt followed by the worked examples.
pub fn system_message() -> String {
    format!("{}\n\n{}", SYSTEM_PROMPT, FEW_SHOT_EXAMPLES)
}

/// User turn for a first draft, with the optional clinical reference first.
pub fn generation_request(prompt: &str, clinical_context: Option<&str>) -> String {
    let context = clinical_context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| {
            format!(
                "\nCLINICAL REFERENCE (Use these guidelines for accurate thresholds):\n{}\n\n",
                c
            )
        })
        .unwrap_or_default();

    format!("{}User request: {}\n\nGenerate PSDL YAML:", context, prompt)
}

/// Single-turn prompt asking the model to fix a failed candidate.
pub fn correction_prompt(previous: &str, errors: &[String], original_prompt: &str) -> String {
    let error_list = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a PSDL expert. The following PSDL YAML has validation errors that need to be fixed.

ORIGINAL USER REQUEST:
{original_prompt}

GENERATED YAML WITH ERRORS:
```yaml
{previous}
```

VALIDATION ERRORS:
{error_list}

COMMON FIXES:
1. Duplicate keys (trends:, logic:, signals:) - YAML only allows ONE of each! Merge all items under a single key.
2. Unknown term references - Make sure all terms in logic rules are defined in trends or other logic rules.
3. Invalid operators - Use sma() not avg(). Use delta(), slope(), last(), min(), max(), etc.
4. Boolean operators - Must be uppercase: AND, OR, NOT (not lowercase).
5. Window format - Must be INTEGER + UNIT like 48h, 7d, 30m (not "48 hours").

INSTRUCTIONS:
1. Fix ALL the errors listed above
2. Keep the same clinical intent as the original
3. Output ONLY the corrected YAML in a ```yaml code block
4. Do NOT add explanations before or after the YAML

Generate the CORRECTED PSDL YAML:"#
    )
}
