//! Prompts for the docking assistant.
//!
//! Extraction prompts ask for one JSON object; the interaction prompt embeds
//! the catalog rows that matched the user's gene and drug.

const BASIC: &str = "\
Analyze the user's input and extract only the specified protein/gene and drug.
Ignore any other details.
Always answer in the same language the user writes in.";

pub fn gene_drug_extraction() -> String {
    format!(
        "{BASIC}
Return the extracted values in exactly this JSON format:
{{
    \"protein\": \"protein\",
    \"drug\": \"drug\"
}}
Use null for a value the user did not mention."
    )
}

pub fn pdb_extraction() -> String {
    "\
Analyze the user's input and extract only the PDB structure they chose.
Ignore any other details.
Return the extracted value in exactly this JSON format:
{
    \"pdb\": \"pdb\"
}"
    .to_string()
}

pub fn options_extraction() -> String {
    "\
Analyze the user's input and extract only the docking options they specified.
Ignore any other details.

PARAMETERS:
- box_enveloping: true if the user asks for default parameters or mentions box enveloping, otherwise false
- padding: numeric padding value
- exhaustiveness: numeric search exhaustiveness
- scoring: scoring function name (vina or ad4)
- box_size: exactly three numbers separated by spaces, e.g. \"10 20 15\"
- box_center: exactly three numbers separated by spaces, e.g. \"5.2 -3.1 8.7\"

Return the values in exactly this JSON format, with null for anything not specified:
{
    \"box_enveloping\": \"True/False\",
    \"padding\": \"numeric_value\",
    \"exhaustiveness\": \"numeric_value\",
    \"scoring\": \"function_name\",
    \"box_size\": \"x y z\",
    \"box_center\": \"x y z\"
}"
    .to_string()
}

/// System prompt for the conversational turn after gene/drug extraction.
/// `drugs` and `genes` are the rendered catalog rows (possibly empty).
pub fn user_interaction(drugs: &str, genes: &str) -> String {
    let drugs = if drugs.trim().is_empty() { "(no matching drugs)" } else { drugs };
    let genes = if genes.trim().is_empty() { "(no matching genes)" } else { genes };
    format!(
        "{BASIC}
After identifying the drug and/or gene, reply in a friendly way:

1. Gene: if it appears in the gene data below, give a one-line summary of what it does;
   otherwise say we have no information for it and ask for another gene.
2. Drug: if it appears in the drug data below, give a one-line summary of what it does;
   otherwise say we have no information for it and ask for another drug.

Only when BOTH the gene and the drug were found:
- if the gene has several PDB structures, list them and ask which one to use;
- if the gene has no PDB structures, say docking is not possible and ask for another gene.
Do not ask further questions.

After the user selects a PDB structure, list ALL docking options:
- padding: number (default 2.0)
- exhaustiveness: number (default 10)
- scoring: \"vina\" or \"ad4\" (default vina)
- box_size: three positive numbers
- box_center: three numbers
box_size and box_center go together, and padding cannot be combined with them.
Ask whether to use the defaults or custom options.

Once the user gives options or accepts the defaults, say the docking is complete and that
the results can be downloaded with the button below.

Drug data:
{drugs}

Gene data:
{genes}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_prompt_embeds_rows() {
        let p = user_interaction("Aspirin | COX inhibitor", "PTGS1 | 1PTH");
        assert!(p.contains("Aspirin | COX inhibitor"));
        assert!(p.contains("PTGS1 | 1PTH"));
    }

    #[test]
    fn test_interaction_prompt_marks_missing_data() {
        let p = user_interaction("", "  ");
        assert!(p.contains("(no matching drugs)"));
        assert!(p.contains("(no matching genes)"));
    }

    #[test]
    fn test_extraction_prompts_request_json() {
        assert!(gene_drug_extraction().contains("\"protein\""));
        assert!(pdb_extraction().contains("\"pdb\""));
        assert!(options_extraction().contains("\"box_center\""));
    }
}
