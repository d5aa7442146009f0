use serde::Serialize;

const INDOOR: [&str; 5] = [
    "Visit a museum or art gallery",
    "Explore local shopping centers",
    "Try local cuisine at indoor restaurants",
    "Visit historical buildings or monuments",
    "Check out local theaters or cinemas",
];

const OUTDOOR: [&str; 5] = [
    "Visit parks and gardens",
    "Take a walking tour of the city",
    "Explore outdoor markets",
    "Visit beaches or lakes",
    "Hike in nearby natural areas",
];

const HOT: [&str; 3] = [
    "Visit air-conditioned museums",
    "Enjoy water activities",
    "Have a picnic in shaded areas",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub temperature: f64,
    pub weather: String,
    pub recommendation: String,
    pub suggested_activities: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Advice for the day from current temperature (°C) and the OpenWeather condition id.
pub fn recommend(temperature: f64, condition_id: i64, weather: &str) -> Recommendation {
    let (text, activities) = match condition_id {
        200..=599 => (
            "It's not the best weather for outdoor activities. Consider indoor options today.",
            owned(&INDOOR),
        ),
        600..=699 if temperature > 0.0 => (
            "It's snowing but not too cold. Enjoy the winter scenery but have indoor backup plans.",
            [
                owned(&INDOOR),
                owned(&["Take photos of snowy landmarks", "Build a snowman in a local park"]),
            ]
            .concat(),
        ),
        600..=699 => (
            "It's cold and snowing. Best to stick to indoor activities today.",
            owned(&INDOOR),
        ),
        700..=799 => (
            "Visibility might be limited. Plan for activities that don't require clear views.",
            [owned(&INDOOR), owned(&["Take a guided tour", "Visit nearby attractions"])].concat(),
        ),
        800 if temperature > 30.0 => (
            "It's clear but very hot. Stay hydrated and seek shade during outdoor activities.",
            owned(&HOT),
        ),
        800 if temperature > 15.0 => (
            "Perfect weather for exploring outdoors!",
            owned(&OUTDOOR),
        ),
        800 => (
            "It's clear but cool. Dress in layers for outdoor activities.",
            owned(&OUTDOOR),
        ),
        _ => (
            "Partly cloudy conditions, generally good for both indoor and outdoor activities.",
            [owned(&OUTDOOR), owned(&INDOOR[..2])].concat(),
        ),
    };

    Recommendation {
        temperature,
        weather: weather.to_string(),
        recommendation: text.to_string(),
        suggested_activities: activities,
    }
}
