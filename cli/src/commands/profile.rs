use anyhow::{Result, bail};
use std::process;

use nutrilog_core::models::{ActivityLevel, DietaryPreference, UserProfile, WeightGoal};

use super::Service;
use super::helpers::json_error;

#[derive(Debug, Default, Clone)]
pub(crate) struct ProfileArgs {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub activity: Option<ActivityLevel>,
    pub diet: Option<DietaryPreference>,
    pub goal: Option<WeightGoal>,
}

impl ProfileArgs {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.weight.is_none()
            && self.height.is_none()
            && self.activity.is_none()
            && self.diet.is_none()
            && self.goal.is_none()
    }
}

/// Merge the given flags into `current`. Without a current profile every
/// field has to be supplied.
fn build_profile(current: Option<UserProfile>, args: ProfileArgs) -> Result<UserProfile> {
    if let Some(mut profile) = current {
        if let Some(name) = args.name {
            profile.name = name;
        }
        if let Some(age) = args.age {
            profile.age = age;
        }
        if let Some(weight) = args.weight {
            profile.weight = weight;
        }
        if let Some(height) = args.height {
            profile.height = height;
        }
        if let Some(activity) = args.activity {
            profile.activity_level = activity;
        }
        if let Some(diet) = args.diet {
            profile.dietary_preference = diet;
        }
        if let Some(goal) = args.goal {
            profile.weight_goal = goal;
        }
        return Ok(profile);
    }

    let mut missing = Vec::new();
    if args.name.is_none() {
        missing.push("--name");
    }
    if args.age.is_none() {
        missing.push("--age");
    }
    if args.weight.is_none() {
        missing.push("--weight");
    }
    if args.height.is_none() {
        missing.push("--height");
    }
    if args.activity.is_none() {
        missing.push("--activity");
    }
    if args.diet.is_none() {
        missing.push("--diet");
    }
    if args.goal.is_none() {
        missing.push("--goal");
    }

    match args {
        ProfileArgs {
            name: Some(name),
            age: Some(age),
            weight: Some(weight),
            height: Some(height),
            activity: Some(activity_level),
            diet: Some(dietary_preference),
            goal: Some(weight_goal),
        } => Ok(UserProfile {
            name,
            age,
            weight,
            height,
            activity_level,
            dietary_preference,
            weight_goal,
        }),
        _ => bail!(
            "No profile yet, so every field is required. Missing: {}",
            missing.join(", ")
        ),
    }
}

pub(crate) fn cmd_profile_set(svc: &Service, args: ProfileArgs, json: bool) -> Result<()> {
    if args.is_empty() {
        bail!(
            "Nothing to set. Provide at least one of --name, --age, --weight, --height, --activity, --diet, --goal"
        );
    }

    let profile = build_profile(svc.user_profile()?, args)?;
    svc.set_user_profile(profile.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Saved profile for {}", profile.name);
        print_profile(&profile);
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(svc: &Service, json: bool) -> Result<()> {
    let Some(profile) = svc.user_profile()? else {
        if json {
            println!("{}", json_error("No profile set"));
        } else {
            eprintln!("No profile set. Create one with `nutrilog profile set`");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

fn print_profile(p: &UserProfile) {
    println!("  Name:       {}", p.name);
    println!("  Age:        {}", p.age);
    println!("  Weight:     {} kg", p.weight);
    println!("  Height:     {} cm", p.height);
    println!("  Activity:   {}", p.activity_level);
    println!("  Diet:       {}", p.dietary_preference);
    println!("  Goal:       {}", p.weight_goal);
}
