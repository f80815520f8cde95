//! Compiled-in lookup tables used when the configuration file does not
//! supply its own.

/// Lowercase location substring → canonical city.
pub const CITY_MAP: &[(&str, &str)] = &[
    ("london", "London"),
    ("city of westminster", "London"),
    ("canary wharf", "London"),
    ("manchester", "Manchester"),
    ("salford", "Manchester"),
    ("birmingham", "Birmingham"),
    ("leeds", "Leeds"),
    ("glasgow", "Glasgow"),
    ("edinburgh", "Edinburgh"),
    ("bristol", "Bristol"),
    ("liverpool", "Liverpool"),
    ("sheffield", "Sheffield"),
    ("newcastle upon tyne", "Newcastle upon Tyne"),
    ("nottingham", "Nottingham"),
    ("leicester", "Leicester"),
    ("cardiff", "Cardiff"),
    ("belfast", "Belfast"),
    ("southampton", "Southampton"),
    ("reading", "Reading"),
    ("cambridge", "Cambridge"),
    ("oxford", "Oxford"),
    ("milton keynes", "Milton Keynes"),
    ("brighton", "Brighton"),
    ("coventry", "Coventry"),
    ("aberdeen", "Aberdeen"),
    ("dundee", "Dundee"),
    ("exeter", "Exeter"),
    ("norwich", "Norwich"),
    ("plymouth", "Plymouth"),
    ("portsmouth", "Portsmouth"),
    ("swansea", "Swansea"),
];

pub const TECHNOLOGIES: &[&str] = &[
    "Excel", "Python", "Java", "Scala", "SQL", "R", "Hadoop", "Spark", "Kafka", "Flink", "Hive",
    "AWS", "Azure", "Google Cloud", "Snowflake", "Databricks", "PostgreSQL", "MySQL",
    "MongoDB", "Cassandra", "Redshift", "BigQuery", "Presto", "Athena", "Vertica", "Airflow",
    "NiFi", "DBT", "Informatica", "Talend", "Luigi", "Stitch", "Fivetran", "Git", "Docker",
    "Kubernetes", "Prefect", "Redis", "Elasticsearch", "Terraform", "Apache",
];

pub const SOFT_SKILLS: &[&str] = &[
    "Clear Communication", "Collaboration", "Listening Skills", "Writing", "Presentation",
    "Negotiation", "Feedback", "Critical Thinking", "Troubleshooting", "Root Cause", "Creativity",
    "Attention to Detail", "Quality Focus", "Time Management", "Delegation", "Project Management",
    "Resource Management", "Risk Management", "Agility", "Multitasking", "Change Management",
    "Business Acumen", "Customer Focus", "Stakeholder Engagement", "Prioritization",
    "Cost-Benefit", "Learning", "Open-mindedness", "Self-motivation", "Resilience", "Flexibility",
    "Growth Mindset", "Teamwork", "Conflict Resolution", "Mentorship", "Empathy",
    "Cultural Sensitivity", "Tools Proficiency", "Leadership", "Decision Making", "Influence",
    "Visionary Thinking", "Empowerment", "Privacy Awareness", "Integrity", "Accountability",
    "Ethics", "Confidentiality", "Conflict Management", "Negotiation",
];
