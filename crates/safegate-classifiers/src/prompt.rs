//! Prompt construction for the generation backend

/// Build the classification prompt for a payload.
///
/// The backend is told to answer with exactly two lines,
/// `VERDICT:<SAFE|MALICIOUS>` and `CATEGORY:<...>`, leaving CATEGORY blank
/// for SAFE verdicts.
pub fn build_prompt(payload: &str) -> String {
    format!(
        "You are a strict web application firewall that classifies HTTP request fragments.\n\
         Decide a VERDICT and a CATEGORY for the request below.\n\
         \n\
         Rules:\n\
         - VERDICT is exactly SAFE or MALICIOUS.\n\
         - CATEGORY is one of:\n  \
           - SQL_INJECTION\n  \
           - XSS\n  \
           - PATH_TRAVERSAL\n  \
           - OTHER\n\
         - When VERDICT is SAFE, leave CATEGORY blank.\n\
         - When VERDICT is MALICIOUS, use SQL_INJECTION, XSS or PATH_TRAVERSAL if one fits, \
         otherwise OTHER.\n\
         - Reply with exactly two lines and nothing else:\n  \
           VERDICT:<SAFE|MALICIOUS>\n  \
           CATEGORY:<SQL_INJECTION|XSS|PATH_TRAVERSAL|OTHER|blank>\n\
         \n\
         Request:\n\
         {payload}\n"
    )
}
