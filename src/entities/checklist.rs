/// Common symptoms offered for checklist-style input.
pub const CHECKLIST_SYMPTOMS: [&str; 18] = [
    "fever",
    "cough",
    "headache",
    "fatigue",
    "sore throat",
    "runny nose",
    "body ache",
    "chills",
    "nausea",
    "vomiting",
    "diarrhea",
    "stomach pain",
    "chest pain",
    "difficulty breathing",
    "dizziness",
    "joint pain",
    "muscle pain",
    "skin rash",
];

/// Joins selected symptoms into the comma-separated text the engine reads.
/// Blank and repeated selections are dropped.
pub fn join_selected<S: AsRef<str>>(selected: &[S]) -> String {
    let mut out: Vec<String> = Vec::new();
    for symptom in selected {
        let symptom = symptom.as_ref().trim().to_lowercase();
        if symptom.is_empty() || out.contains(&symptom) {
            continue;
        }
        out.push(symptom);
    }
    out.join(", ")
}
