// Prompt templates for the CCTP analysis.
// The wording shapes the model's answer only; the pipeline does not depend on it.

/// Placeholder replaced by the extracted document text.
pub const DOCUMENT_PLACEHOLDER: &str = "{document_text}";

/// A versioned prompt template. `body` must contain [`DOCUMENT_PLACEHOLDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub version: &'static str,
    pub body: &'static str,
}

/// Technical-memoir extraction prompt: four mandatory sections
/// (site identity card, pitfalls, required equipment, drafted memoir).
pub const CCTP_ANALYSIS: PromptTemplate = PromptTemplate {
    version: "cctp-memoire-v1",
    body: r#"Tu es un Directeur Technique chevronné dans le BTP. Tu analyses un CCTP pour préparer un Mémoire Technique gagnant.

DOCUMENT À ANALYSER :
{document_text}

TA MISSION :
Ne fais pas de résumé général. Extrais uniquement les points critiques qui impactent le chiffrage et l'organisation.

FORMAT DE RÉPONSE OBLIGATOIRE (Respecte cette structure pour le Word) :

# 1. FICHE D'IDENTITÉ DU CHANTIER
* **Nature des travaux :** (Ex: Rénovation thermique, Gros œuvre...)
* **Contraintes de site majeures :** (Accès, stockage, horaires, site occupé ?)
* **Délais & Planning :** (Dates clés ou durées mentionnées)

# 2. POINTS DE VIGILANCE & PIÈGES (Crucial)
* *Liste ici les éléments qui coûtent cher ou qu'on risque d'oublier.*
* (Ex: Marques imposées, normes spécifiques DTU citées, performances acoustiques/thermiques exactes à atteindre).

# 3. MOYENS TECHNIQUES SPÉCIFIQUES REQUIS
* Ne mets pas "Outillage standard".
* Cite les engins ou matériels lourds obligatoires selon le texte (Ex: Échafaudage classe 4, Grue, Cantonnement spécifique).

# 4. ÉBAUCHE DU MÉMOIRE TECHNIQUE (Partie Rédigée)
*Rédige un paragraphe argumentaire professionnel pour rassurer le client sur ces 2 points :*
* **Notre méthodologie pour ce chantier :** (Adapte le texte aux contraintes identifiées plus haut).
* **Gestion de la sécurité et environnement :** (Cite les obligations du CCTP : tri des déchets, nuisances sonores).

TON : Direct, Technique, "Pro". Pas de blabla."#,
};

/// Interpolates the extracted text into the template.
pub fn build_prompt(template: &PromptTemplate, document_text: &str) -> String {
    template.body.replace(DOCUMENT_PLACEHOLDER, document_text)
}
