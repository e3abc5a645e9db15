use crate::error::LaunchError;
use crate::model::ParamValue;

pub const TASK_NAMES: &[&str] = &["frame", "webdetect", "webdetectonly"];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl DefaultValue {
    pub fn value_type(self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Boolean,
            Self::Int(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::String,
        }
    }

    pub fn to_value(self) -> ParamValue {
        match self {
            Self::Bool(value) => ParamValue::Bool(value),
            Self::Int(value) => ParamValue::Int(value),
            Self::Float(value) => ParamValue::Float(value),
            Self::Str(value) => ParamValue::Str(value.to_string()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    pub necessary_if: &'static [&'static str],
    pub default: Option<DefaultValue>,
    pub choices: &'static [&'static str],
    pub help: &'static str,
}

impl ParamSpec {
    pub const fn new(name: &'static str, value_type: ValueType, help: &'static str) -> Self {
        Self {
            name,
            value_type,
            required: false,
            necessary_if: &[],
            default: None,
            choices: &[],
            help,
        }
    }

    pub const fn string(name: &'static str, help: &'static str) -> Self {
        Self::new(name, ValueType::String, help)
    }

    pub const fn integer(name: &'static str, help: &'static str) -> Self {
        Self::new(name, ValueType::Integer, help)
    }

    pub const fn float(name: &'static str, help: &'static str) -> Self {
        Self::new(name, ValueType::Float, help)
    }

    pub const fn flag(name: &'static str, help: &'static str) -> Self {
        Self::new(name, ValueType::Boolean, help)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn necessary_if(mut self, targets: &'static [&'static str]) -> Self {
        self.necessary_if = targets;
        self
    }

    pub const fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    pub fn is_boolean(&self) -> bool {
        self.value_type == ValueType::Boolean
    }

    // A switch without a declared default is off.
    pub fn effective_default(&self) -> Option<DefaultValue> {
        match (self.default, self.value_type) {
            (Some(default), _) => Some(default),
            (None, ValueType::Boolean) => Some(DefaultValue::Bool(false)),
            (None, _) => None,
        }
    }

    // Switches count as set only when on; everything else when present.
    pub fn is_set(&self, value: Option<&ParamValue>) -> bool {
        match self.value_type {
            ValueType::Boolean => matches!(value, Some(ParamValue::Bool(true))),
            _ => value.is_some(),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Schema {
    specs: &'static [ParamSpec],
}

impl Schema {
    pub const fn new(specs: &'static [ParamSpec]) -> Self {
        Self { specs }
    }

    pub fn iter(&self) -> std::slice::Iter<'static, ParamSpec> {
        self.specs.iter()
    }

    pub fn get(&self, name: &str) -> Result<&'static ParamSpec, LaunchError> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| LaunchError::UnknownParameter(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }
}

pub static SCHEMA: Schema = Schema::new(PARAMETERS);

const PARAMETERS: &[ParamSpec] = &[
    ParamSpec::string("task_name", "Downstream task to train")
        .required()
        .choices(TASK_NAMES),
    ParamSpec::string("dataset", "Dataset directory under the subset root").required(),
    ParamSpec::string("model_type", "Model architecture family")
        .default(DefaultValue::Str("bert")),
    ParamSpec::string("model_name_or_path", "Pretrained model name or checkpoint path")
        .default(DefaultValue::Str("bert-base-uncased")),
    ParamSpec::string("cache_dir", "Where to store downloaded pretrained models"),
    ParamSpec::integer("max_seq_length", "Maximum input length after tokenization")
        .default(DefaultValue::Int(128)),
    ParamSpec::flag("do_train", "Run training"),
    ParamSpec::flag("do_eval", "Run evaluation on the dev set"),
    ParamSpec::flag("do_lower_case", "Lowercase input text"),
    ParamSpec::flag("evaluate_during_training", "Evaluate at each logging step"),
    ParamSpec::integer("per_gpu_train_batch_size", "Training batch size per device")
        .default(DefaultValue::Int(8)),
    ParamSpec::integer("per_gpu_eval_batch_size", "Evaluation batch size per device")
        .default(DefaultValue::Int(8)),
    ParamSpec::integer(
        "gradient_accumulation_steps",
        "Update steps to accumulate before a backward pass",
    )
    .default(DefaultValue::Int(1)),
    ParamSpec::float("learning_rate", "Initial learning rate for Adam")
        .default(DefaultValue::Float(5e-5)),
    ParamSpec::float("weight_decay", "Weight decay if applied").default(DefaultValue::Float(0.0)),
    ParamSpec::float("adam_epsilon", "Epsilon for Adam").default(DefaultValue::Float(1e-8)),
    ParamSpec::float("max_grad_norm", "Gradient clipping norm").default(DefaultValue::Float(1.0)),
    ParamSpec::float("num_train_epochs", "Total training epochs per phase")
        .default(DefaultValue::Float(3.0)),
    ParamSpec::integer("warmup_steps", "Linear warmup steps").default(DefaultValue::Int(0)),
    ParamSpec::integer("logging_steps", "Log every N update steps")
        .default(DefaultValue::Int(50)),
    ParamSpec::integer("save_steps", "Checkpoint every N update steps")
        .default(DefaultValue::Int(50)),
    ParamSpec::integer("seed", "Random seed").default(DefaultValue::Int(42)),
    ParamSpec::flag("overwrite_output_dir", "Overwrite the fold output directory"),
    ParamSpec::flag("use_focal_loss", "Train with focal loss instead of cross entropy"),
    ParamSpec::float("focal_loss_gamma", "Focal loss focusing parameter")
        .necessary_if(&["use_focal_loss"]),
    ParamSpec::flag("use_class_weights", "Weight the loss by inverse class frequency"),
    ParamSpec::flag("fp16", "Use mixed precision"),
    ParamSpec::string("fp16_opt_level", "Apex AMP optimization level")
        .necessary_if(&["fp16"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_default_to_off_unless_declared() {
        let fp16 = SCHEMA.get("fp16").expect("parameter should exist");
        assert_eq!(fp16.effective_default(), Some(DefaultValue::Bool(false)));

        let declared = ParamSpec::flag("overwrite_cache", "").default(DefaultValue::Bool(true));
        assert_eq!(declared.effective_default(), Some(DefaultValue::Bool(true)));

        let gamma = SCHEMA.get("focal_loss_gamma").expect("parameter should exist");
        assert_eq!(gamma.effective_default(), None);
    }

    #[test]
    fn lookup_by_name_finds_builtin_parameters() {
        let spec = SCHEMA.get("focal_loss_gamma").expect("parameter should exist");
        assert_eq!(spec.value_type, ValueType::Float);
        assert_eq!(spec.necessary_if, &["use_focal_loss"]);
        assert!(!spec.required);
    }

    #[test]
    fn lookup_of_unknown_name_fails() {
        let error = SCHEMA.get("not_a_parameter").expect_err("lookup should fail");
        assert!(matches!(error, LaunchError::UnknownParameter(name) if name == "not_a_parameter"));
    }

    #[test]
    fn names_are_unique() {
        let mut names = SCHEMA.iter().map(|spec| spec.name).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCHEMA.len());
    }

    #[test]
    fn is_set_depends_on_value_type() {
        let flag = ParamSpec::flag("do_train", "");
        assert!(flag.is_set(Some(&ParamValue::Bool(true))));
        assert!(!flag.is_set(Some(&ParamValue::Bool(false))));
        assert!(!flag.is_set(None));

        let rate = ParamSpec::float("learning_rate", "");
        assert!(rate.is_set(Some(&ParamValue::Float(0.0))));
        assert!(!rate.is_set(None));
    }
}
