//! Prompt builders.

use ishorts_models::{Series, VideoScene};

const NO_EXISTING_TITLES: &str = "- None (this is the first video)";

/// Bullet list of titles already used in a series.
pub fn format_existing_titles(titles: &[String]) -> String {
    let lines: Vec<String> = titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("- {}", t))
        .collect();

    if lines.is_empty() {
        NO_EXISTING_TITLES.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn title_prompt(series: &Series, existing_titles: &[String]) -> String {
    format!(
        r#"You are creating a title for a new video in a series.

Series Title: {}
Series Description: {}

The following titles have already been used in this series:
{}

Generate a unique, engaging title for the next video in this series. The title should:
- Be relevant to the series theme
- Be different from all existing titles
- Be catchy and engaging
- Be under 100 characters

Respond in JSON format with this structure:
{{
  "title": "your generated title here"
}}"#,
        series.title,
        series.description,
        format_existing_titles(existing_titles)
    )
}

pub fn scene_breakdown_prompt(series: &Series, video_title: &str) -> String {
    format!(
        r#"You are a visual storyteller creating a short vertical video (InstaShorts) for a series titled "{}" with the description "{}".
The video's title is: "{}".
Based on the title, create a visual breakdown of 3 to 5 distinct scenes.
For each scene, provide a detailed description of the setting and action, and an approximate duration in seconds.
The total duration of all scenes should be between 15 and 30 seconds."#,
        series.title, series.description, video_title
    )
}

/// Shared look applied to every scene of a series.
pub fn global_style(series: &Series, style: &str) -> String {
    format!(
        "A {} themed video with a {} color grading, cinematic, 4k, hyperrealistic",
        series.title, style
    )
}

pub fn scene_prompt(series: &Series, style: &str, scene_description: &str) -> String {
    format!(
        r#"Generate a single, hyper-detailed, high-quality text-to-video prompt for a modern AI video model.
The video is part of a series titled "{}" with the overall theme/style: "{}".
The specific scene description is: "{}".
The generated prompt must maintain consistent styling and color grading with the overall theme.
The prompt must be a single, continuous text block and MUST include specific camera movements (e.g., Dolly Zoom, Tracking Shot, Wide Angle, Close-up, Pan-right, Tilt-down) and subject actions.
Do NOT use commas in the generated prompt, only spaces."#,
        series.title,
        global_style(series, style),
        scene_description
    )
}

pub fn script_prompt(series: &Series, video_title: &str, scenes: &[VideoScene]) -> String {
    let total: f32 = scenes.iter().map(|s| s.duration).sum();
    let summary: String = scenes
        .iter()
        .map(|s| {
            format!(
                "\n- Scene {} ({:.1}s): '{}'. Video Prompt: '{}'",
                s.scene_number, s.duration, s.description, s.prompt
            )
        })
        .collect();

    format!(
        r#"You are a creative script writer for the series '{}' ({}).
Write the narrator voiceover for the video titled "{}".
The voiceover must follow these visual scenes in order and fit their timing:{}

The whole script should take about {:.0} seconds to read aloud and be written for one narrator."#,
        series.title, series.description, video_title, summary, total
    )
}
