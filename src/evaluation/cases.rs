//! Labelled example texts for the bundled psychiatry label sets.

use crate::pipeline::Category;

pub const SECTION_CASES: &[(&str, &str)] = &[
    ("I'm constantly worried about everything, even when I know there's no need.", "Chief Complaint"),
    ("Patient reports feeling down and anxious all the time.", "Chief Complaint"),
    ("Main Issue: Anger outbursts and irritability for 6 months.", "Chief Complaint"),
    (
        "Persistent, excessive worry most days, difficulty controlling the worry. Onset approximately 6 months ago. Severity 7/10.",
        "History of Present Illness",
    ),
    (
        "Getting angry over little things, hitting wife, irritable on mother. Sleep disturbance - sleep at 2AM, waking up 5AM.",
        "History of Present Illness",
    ),
    (
        "Symptoms include persistent low mood, anhedonia, fatigue, interrupted sleep with early morning awakening.",
        "History of Present Illness",
    ),
    ("No prior diagnoses or treatments. No hospitalizations or suicidality history.", "Past Psychiatric History"),
    ("OCD diagnosed 5 years ago. Previous trial of fluoxetine with partial response.", "Past Psychiatric History"),
    ("Denies alcohol, tobacco, or illicit drugs. Occasional caffeine 2 cups/day.", "Substance Use History"),
    ("Smoking tobacco, nicotine, alcohol once a month.", "Substance Use History"),
    ("Mother has history of depression treated with SSRIs.", "Family Psychiatric History"),
    ("History of psychiatric illness in mother.", "Family Psychiatric History"),
    ("Single, lives alone, unemployed, high school graduate. Remote work previously in IT.", "Social History"),
    ("B.Tech software engineer, married, upper middle class, living with wife.", "Social History"),
    (
        "Appearance: Well-groomed. Behavior: Cooperative. Speech: Normal. Mood: Anxious. Affect: Constricted.",
        "Mental Status Examination",
    ),
    (
        "General appearance: Unkempt, hyper alert. PMA increased. Talk: QTR increased. Affect perplexed, mood dysphoric.",
        "Mental Status Examination",
    ),
    ("Major Depressive Disorder, single episode, moderate (F32.1). No suicidal ideation.", "Assessment"),
    ("Generalized Anxiety Disorder (GAD), moderate. Risk Assessment: No SI or HI.", "Assessment"),
    ("Start sertraline 50mg daily. Refer to CBT therapist. Follow-up 2 weeks.", "Plan"),
    ("Continue fluvoxamine 200mg daily. Continue weekly ERP with therapist. Follow-up 4 weeks.", "Plan"),
];

pub const DOMAIN_CASES: &[(&str, &str)] = &[
    ("Sleep at 2AM, waking up 5AM, interrupted sleep.", "Sleep"),
    ("Patient reports insomnia with early morning awakening.", "Sleep"),
    ("Sleep improved to 6-7 hours with medication.", "Sleep"),
    ("Persistent low mood, feeling down, hopeless.", "Mood"),
    ("Mood dysphoric, feeling sad and empty.", "Mood"),
    ("Mood more stable on current medication regimen.", "Mood"),
    ("Excessive worry about everything, can't stop worrying.", "Anxiety"),
    ("Panic attacks 2-3 times per week with palpitations.", "Anxiety"),
    ("Feels overwhelmed and worried about future attacks.", "Anxiety"),
    ("Getting angry over little things, hitting wife.", "Anger"),
    ("Irritability, anger outbursts, temper issues.", "Anger"),
    ("Decreased irritability and better impulse control.", "Anger"),
    ("Decreased appetite with 10 lb weight loss.", "Appetite"),
    ("Appetite remains decreased, not eating well.", "Appetite"),
    ("Fatigue, tiredness, decreased energy.", "Energy"),
    ("Energy levels slightly better with treatment.", "Energy"),
    ("Difficulty concentrating at work, can't focus.", "Concentration"),
    ("Attention slightly impaired, brain fog.", "Concentration"),
    ("Anhedonia, loss of interest in activities.", "Interest"),
    ("Continued anhedonia despite medication.", "Interest"),
    ("Not bathing, wearing same clothes 3-4 days.", "Self-care"),
    ("Unkempt appearance, poor personal hygiene.", "Self-care"),
    ("Auditory hallucinations minimal, paranoid thoughts decreased.", "Psychosis"),
    ("No delusions or hallucinations reported.", "Psychosis"),
    ("Denies suicidal ideation, no SI or HI.", "Safety"),
    ("No suicidal or homicidal ideation reported.", "Safety"),
    ("Columbia Suicide Scale: Negative.", "Safety"),
    ("Strong cravings but maintaining abstinence.", "Substance"),
    ("60 days of sobriety, attending AA meetings.", "Substance"),
    ("Alcohol once a month, smoking tobacco.", "Substance"),
];

pub const SAFETY_CASES: &[(&str, &str)] = &[
    ("Denies suicidal ideation.", "SI_Denied"),
    ("No SI or HI.", "SI_Denied"),
    ("Columbia Suicide Scale: Negative.", "SI_Denied"),
    ("No suicidal thoughts reported.", "SI_Denied"),
    ("Patient reports thoughts of wanting to die.", "SI_Present"),
    ("Active suicidal ideation with plan.", "SI_Present"),
    ("Passive SI, wishes they were dead.", "SI_Present"),
    ("Denies homicidal ideation.", "HI_Denied"),
    ("No thoughts of harming others.", "HI_Denied"),
    ("No HI or violent ideation.", "HI_Denied"),
    ("Thoughts of harming others, HI present.", "HI_Present"),
    ("Homicidal ideation toward ex-partner.", "HI_Present"),
    ("Denies self-harm behavior.", "SelfHarm_Denied"),
    ("No history of cutting or self-injury.", "SelfHarm_Denied"),
    ("History of cutting, recent self-harm.", "SelfHarm_Present"),
    ("Engaged in self-injurious behavior.", "SelfHarm_Present"),
];

/// Labelled cases matching the bundled label set of `category`.
pub fn builtin_cases(category: Category) -> &'static [(&'static str, &'static str)] {
    match category {
        Category::Sections => SECTION_CASES,
        Category::Domains => DOMAIN_CASES,
        Category::Safety => SAFETY_CASES,
    }
}
