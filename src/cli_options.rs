use std::collections::HashMap;

use itertools::Itertools;

pub struct CliOptions {
    pub use_multi_thread: bool,
    pub scene_name: String,
    pub num_rays: usize,
    pub seed: u64,
    pub stack_capacity: Option<usize>,
    pub visit_budget: Option<usize>,
    pub show_help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            use_multi_thread: true,
            scene_name: String::from("random_spheres"),
            num_rays: 1 << 20,
            seed: 0,
            stack_capacity: None,
            visit_budget: None,
            show_help: false,
        }
    }
}

impl CliOptions {
    pub fn message() -> String {
        format!(
            r#"
        --use_multi_thread | --use_single_thread
        --scene_name <{}>
        --num_rays <count>
        --seed <u64>
        --stack_capacity <1..=64>
        --visit_budget <nodes per query>
        --help
        "#,
            scene::preset::PRESET_NAMES.iter().join(" | ")
        )
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("Missing value for {}", key))?;
    value
        .parse()
        .map_err(|_| format!("Invalid value {} for {}", value, key))
}

pub fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut pairs: HashMap<String, Option<String>> = HashMap::new();
    let mut args = args.into_iter().rev().collect::<Vec<_>>();
    args.pop(); // Removes args[0]

    while let Some(key) = args.pop() {
        if !key.starts_with('-') {
            return Err(format!("Unrecognized key {}", key));
        }
        match args.last() {
            None => {
                pairs.insert(key, None);
            }
            Some(value) => {
                if value.starts_with('-') {
                    pairs.insert(key, None);
                } else {
                    let value = args.pop();
                    pairs.insert(key, value);
                }
            }
        }
    }
    let mut options = CliOptions::default();
    for (k, v) in pairs.into_iter() {
        match k.as_str() {
            "--use_multi_thread" => options.use_multi_thread = true,
            "--use_single_thread" => options.use_multi_thread = false,
            "--scene_name" => options.scene_name = parse_value(&k, v)?,
            "--num_rays" => options.num_rays = parse_value(&k, v)?,
            "--seed" => options.seed = parse_value(&k, v)?,
            "--stack_capacity" => {
                let capacity: usize = parse_value(&k, v)?;
                if capacity == 0 || capacity > lbvh::MAX_STACK_CAPACITY {
                    return Err(format!(
                        "Stack capacity must be in 1..={}, got {}",
                        lbvh::MAX_STACK_CAPACITY,
                        capacity
                    ));
                }
                options.stack_capacity = Some(capacity);
            }
            "--visit_budget" => options.visit_budget = Some(parse_value(&k, v)?),
            "--help" => options.show_help = true,
            _ => return Err(format!("Unrecognized key {}", k)),
        }
    }
    Ok(options)
}
