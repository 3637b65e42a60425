use serde_json::Value;

pub fn print_playlist_pretty(json: &Value, indent_level: usize) -> String {
    return format!(
        "{}\"{}\" ({}) - {}",
        "\t".repeat(indent_level),
        json["snippet"]["title"].as_str().unwrap_or("null"),
        json["id"].as_str().unwrap_or("null"),
        json["snippet"]["channelTitle"].as_str().unwrap_or("null"),
    );
}

pub fn print_playlist(json: &Value, indent_level: usize) -> String {
    return format!(
        "{}{}",
        "\t".repeat(indent_level),
        json["id"].as_str().unwrap_or("null")
    );
}

pub fn print_search_hit_pretty(json: &Value, indent_level: usize) -> String {
    return format!(
        "{}\"{}\" by {} ({})",
        "\t".repeat(indent_level),
        json["snippet"]["title"].as_str().unwrap_or("null"),
        json["snippet"]["channelTitle"].as_str().unwrap_or("null"),
        search_hit_id(json),
    );
}

pub fn print_search_hit(json: &Value, indent_level: usize) -> String {
    return format!("{}{}", "\t".repeat(indent_level), search_hit_id(json));
}

// A search hit's id sits under a kind-specific key
fn search_hit_id(json: &Value) -> &str {
    json["id"]["videoId"]
        .as_str()
        .or_else(|| json["id"]["playlistId"].as_str())
        .or_else(|| json["id"]["channelId"].as_str())
        .unwrap_or("null")
}

pub fn print_playlist_list(json: &Value, indent_level: usize) -> String {
    json.as_array()
        .unwrap_or(&vec![])
        .iter()
        .map(|item| print_playlist(item, indent_level))
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn print_playlist_list_pretty(json: &Value, indent_level: usize) -> String {
    json.as_array()
        .and_then(|arr| {
            Some(
                arr.iter()
                    .map(|item| print_playlist_pretty(item, indent_level))
                    .collect::<Vec<String>>()
                    .join("\n"),
            )
        })
        .unwrap_or(format!("{}{}", "\t".repeat(indent_level), "None"))
}

pub fn print_search_hit_list(json: &Value, indent_level: usize) -> String {
    json.as_array()
        .unwrap_or(&vec![])
        .iter()
        .map(|item| print_search_hit(item, indent_level))
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn print_search_hit_list_pretty(json: &Value, indent_level: usize) -> String {
    json.as_array()
        .and_then(|arr| {
            Some(
                arr.iter()
                    .map(|item| print_search_hit_pretty(item, indent_level))
                    .collect::<Vec<String>>()
                    .join("\n"),
            )
        })
        .unwrap_or(format!("{}{}", "\t".repeat(indent_level), "None"))
}

pub fn print_id_list(ids: &[String]) -> String {
    ids.join("\n")
}

pub fn print_ranked_titles(titles: &[String]) -> String {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<String>>()
        .join("\n")
}
