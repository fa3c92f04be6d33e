use crate::models::Profile;

/// Build the system prompt from the owner's profile data.
/// This way the assistant always has the latest site data without manual
/// duplication, and the instruction block constrains it to answer only
/// from the embedded facts.
pub fn compose(profile: &Profile) -> String {
    let skills = profile
        .skills
        .iter()
        .map(|s| format!("- {} ({})", s.name, s.category))
        .collect::<Vec<_>>()
        .join("\n");

    let experience = profile
        .experience
        .iter()
        .map(|e| format!("- {} at {} ({}): {}", e.role, e.company, e.period, e.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant embedded in {name}'s portfolio website.\n\
         You answer questions about the developer based ONLY on the following information.\n\
         If asked something not covered below, politely say you don't have that information and suggest they use the contact form.\n\
         \n\
         Be concise, friendly, and professional. Keep responses under 3 paragraphs.\n\
         Use markdown formatting when helpful (bold, lists, etc).\n\
         \n\
         === DEVELOPER INFO ===\n\
         Name: {name}\n\
         Role: {tagline}\n\
         Location: {location}\n\
         Email: {email}\n\
         \n\
         === SKILLS ===\n\
         {skills}\n\
         \n\
         === EXPERIENCE ===\n\
         {experience}\n\
         \n\
         === ABOUT ===\n\
         {bio}\n",
        name = profile.name,
        tagline = profile.tagline,
        location = profile.location,
        email = profile.email,
        skills = skills,
        experience = experience,
        bio = profile.bio.join(" "),
    )
}
